pub mod decompression;
pub mod deployment;
pub mod library;
pub mod mod_fs;
pub mod mod_manager;
pub mod mod_stager;
pub mod quarantine;
pub mod reconciler;
