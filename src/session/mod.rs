pub mod cancel;
pub mod run;
