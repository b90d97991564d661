use clap::Parser;
use jsondir_storage::{CollectionOptions, PersistentStorage, DEFAULT_MAX_ITEMS};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Parser)]
#[command(name = "jsondir-server")]
#[command(about = "Serve a directory of JSON files as REST collections", long_about = None)]
pub struct Config {
    /// Directory holding `api/` collections and `assets/`.
    #[arg(env = "JSONDIR_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,
    #[arg(long, env = "JSONDIR_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(short, long, env = "JSONDIR_PORT", default_value_t = 4000)]
    pub port: u16,
    /// Inserts fail once a collection holds this many items.
    #[arg(long, env = "JSONDIR_MAX_ITEMS", default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn collection_options(&self) -> CollectionOptions {
        CollectionOptions::new(self.base_dir.clone(), Arc::new(PersistentStorage::new()))
            .with_max_items(self.max_items)
    }
}
