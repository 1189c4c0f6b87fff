pub mod statistic;
