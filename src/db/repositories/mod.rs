pub mod attempt;
pub mod audit;
pub mod booking;
pub mod token;
pub mod user;
