mod callback;
mod helpers;
mod updates;
