mod catalog;
mod eval;
mod run;
