pub mod error;
pub mod leaderboard;
pub mod ports;
pub mod quota;
pub mod repo;
pub mod rewards;
pub mod service;
