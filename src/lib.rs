pub mod avatar;
pub mod demo_feed;
pub mod http_client;
pub mod predictor;
pub mod provider;
pub mod state;
pub mod stats;
pub mod strava_fetch;
