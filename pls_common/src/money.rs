use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Coins       -----------------------------------------------------------
/// The in-app currency. Debited per pairing, credited per successful purchase or referral.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Coins(i64);

op!(binary Coins, Add, add);
op!(binary Coins, Sub, sub);
op!(inplace Coins, SubAssign, sub_assign);
op!(unary Coins, Neg, neg);

impl Mul<i64> for Coins {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Coins {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Coins {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Coins {}

impl Display for Coins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} coin(s)", self.0)
    }
}

impl Coins {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

//--------------------------------------        Rial       -----------------------------------------------------------
/// An amount in the gateway's minor currency unit.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rial(i64);

op!(binary Rial, Add, add);
op!(binary Rial, Sub, sub);
op!(inplace Rial, SubAssign, sub_assign);
op!(unary Rial, Neg, neg);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in Rial: {0}")]
pub struct RialConversionError(String);

impl From<i64> for Rial {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rial {
    type Error = RialConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RialConversionError(format!("Value {value} is too large to convert to Rial")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl PartialEq for Rial {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rial {}

impl Display for Rial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} IRR", self.0)
    }
}

impl Rial {
    pub fn value(&self) -> i64 {
        self.0
    }
}
