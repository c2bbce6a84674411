pub mod answer;
pub mod budget;
pub mod catalog;
pub mod db_util;
pub mod progress;
pub mod rank;
pub mod submit;
pub mod unlock;

#[cfg(test)]
pub mod testkit;
