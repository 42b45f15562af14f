use log::{debug, info};

use crate::config::CaseSensitivity;
use crate::filesystem::{FsError, LinkResolver, NativeLocalFileSystem, Result};
use crate::native::NativeDirectoryQuery;

#[derive(Debug, Clone)]
pub struct FsFactory<Q, L> {
    query: Q,
    links: L,
    case: CaseSensitivity,
}

impl<Q, L> FsFactory<Q, L>
where
    Q: NativeDirectoryQuery + Clone,
    L: LinkResolver + Clone,
{
    pub fn new(query: Q, links: L) -> Self {
        Self {
            query,
            links,
            case: CaseSensitivity::host(),
        }
    }

    pub fn with_case_sensitivity(mut self, case: CaseSensitivity) -> Self {
        self.case = case;
        self
    }

    pub fn is_available(&self) -> bool {
        self.query.is_available()
    }

    pub fn worker(&self) -> WorkerFs<Q, L> {
        WorkerFs {
            factory: self.clone(),
            instance: None,
            acquisitions: 0,
        }
    }
}

/// A worker's private filesystem slot. Never shared between workers.
pub struct WorkerFs<Q: NativeDirectoryQuery, L: LinkResolver> {
    factory: FsFactory<Q, L>,
    instance: Option<NativeLocalFileSystem<Q, L>>,
    acquisitions: u64,
}

impl<Q, L> WorkerFs<Q, L>
where
    Q: NativeDirectoryQuery + Clone,
    L: LinkResolver + Clone,
{
    pub fn acquire(&mut self) -> Result<&mut NativeLocalFileSystem<Q, L>> {
        if !self.factory.is_available() {
            return Err(FsError::NativeUnavailable);
        }

        let factory = &self.factory;
        let fs = self.instance.get_or_insert_with(|| {
            info!("Creating native filesystem instance");
            NativeLocalFileSystem::new(factory.query.clone(), factory.links.clone(), factory.case)
        });
        // Every acquisition starts a new validity epoch
        fs.cache_mut().clear_cache();

        self.acquisitions += 1;
        debug!("Acquired native filesystem, epoch {}", self.acquisitions);
        Ok(fs)
    }

    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }
}
