use crate::app::error::{Error, Result};
use crate::app::filter::PathFilter;
use crate::app::vault::{Listing, Vault};
use std::collections::HashSet;
use std::path::PathBuf;

pub struct Scanner<'a> {
    vault: &'a dyn Vault,
    filter: PathFilter<'a>,
}

impl<'a> Scanner<'a> {
    pub fn new(vault: &'a dyn Vault, filter: PathFilter<'a>) -> Self {
        Self { vault, filter }
    }

    /// Files under `root`: a folder's own files come before anything in its
    /// subfolders, and subfolders follow listing order.
    pub fn scan(&self, root: &str) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.visit(root, |listing| {
            files.extend(
                listing
                    .files
                    .iter()
                    .filter(|f| self.filter.include_file(f))
                    .cloned(),
            );
        })?;
        Ok(files)
    }

    /// Every non-ignored folder under `root` (excluding `root`), pre-order.
    pub fn list_directories(&self, root: &str) -> Result<Vec<String>> {
        let mut dirs = Vec::new();
        let mut first = true;
        self.visit_dirs(root, |dir| {
            if first {
                first = false;
            } else {
                dirs.push(dir.to_string());
            }
        })?;
        Ok(dirs)
    }

    fn visit(&self, root: &str, mut on_listing: impl FnMut(&Listing)) -> Result<()> {
        let mut visited = HashSet::new();
        let mut stack = vec![root.to_string()];

        while let Some(dir) = stack.pop() {
            self.mark_visited(&mut visited, &dir)?;
            let listing = self.vault.list(&dir).map_err(|e| Error::io(dir.as_str(), e))?;
            log::debug!(
                "Listed {}: {} files, {} folders",
                dir,
                listing.files.len(),
                listing.folders.len()
            );
            on_listing(&listing);
            self.push_children(&mut stack, &listing.folders);
        }
        Ok(())
    }

    fn visit_dirs(&self, root: &str, mut on_dir: impl FnMut(&str)) -> Result<()> {
        let mut visited = HashSet::new();
        let mut stack = vec![root.to_string()];

        while let Some(dir) = stack.pop() {
            self.mark_visited(&mut visited, &dir)?;
            on_dir(&dir);
            let listing = self.vault.list(&dir).map_err(|e| Error::io(dir.as_str(), e))?;
            self.push_children(&mut stack, &listing.folders);
        }
        Ok(())
    }

    /// Reversed so the first listed folder is popped first.
    fn push_children(&self, stack: &mut Vec<String>, folders: &[String]) {
        for folder in folders.iter().rev() {
            if self.filter.include_dir(folder) {
                stack.push(folder.clone());
            } else {
                log::debug!("Pruned {}", folder);
            }
        }
    }

    fn mark_visited(&self, visited: &mut HashSet<PathBuf>, dir: &str) -> Result<()> {
        let identity = self
            .vault
            .canonicalize(dir)
            .map_err(|e| Error::io(dir, e))?;
        if visited.insert(identity) {
            Ok(())
        } else {
            Err(Error::CycleDetected(dir.to_string()))
        }
    }
}
