pub mod clip_audit;
