//! Registry resolution, downloading and installation for idepack
//!
//! - [`RegistryResolver`]: local > test > official lookup, links, index updates
//! - [`Downloader`]: cached, SHA256-verified archive fetches
//! - [`Installer`]: install / uninstall / batch install into `<root>/repos`

pub mod download;
pub mod error;
pub mod http;
pub mod installer;
pub mod registry;
pub mod resolver;

pub use download::{Downloader, tarball_url};
pub use error::{RepoError, Result};
pub use http::HttpClient;
pub use installer::{BatchReport, InstalledPackage, Installer};
pub use registry::{Registry, RegistryTier};
pub use resolver::{RegistryResolver, ResolvedPack};
