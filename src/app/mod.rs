pub mod estimate_api;
