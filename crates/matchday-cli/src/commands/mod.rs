pub mod calendar;
pub mod event;
pub mod game;
pub mod matches;
pub mod schedule;
pub mod series;
