pub mod fake_provider;
pub mod prepare_env;
