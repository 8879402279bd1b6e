pub mod email_cache;
