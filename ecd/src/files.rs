//! Open-file bookkeeping of a controller scheme.

use std::collections::BTreeMap;

use syscall::{Error, Result, EACCES, EBADF, ENOENT, O_ACCMODE, O_RDONLY};

struct OpenFile {
    writable: bool,
}

/// Files opened on one `ec<N>` scheme. The scheme has a single file, its root, which is the
/// register space; opening it for writing is reserved to root.
#[derive(Default)]
pub struct OpenFiles {
    files: BTreeMap<usize, OpenFile>,
    next_id: usize,
}

impl OpenFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: &str, flags: usize, uid: u32) -> Result<usize> {
        if !path.trim_matches('/').is_empty() {
            return Err(Error::new(ENOENT));
        }

        let writable = flags & O_ACCMODE != O_RDONLY;
        if writable && uid != 0 {
            return Err(Error::new(EACCES));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.files.insert(id, OpenFile { writable });
        Ok(id)
    }

    /// Fails with `EBADF` unless `id` is open.
    pub fn check(&self, id: usize) -> Result<()> {
        if self.files.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::new(EBADF))
        }
    }

    /// Fails with `EBADF` unless `id` was opened for writing.
    pub fn check_writable(&self, id: usize) -> Result<()> {
        match self.files.get(&id) {
            Some(file) if file.writable => Ok(()),
            _ => Err(Error::new(EBADF)),
        }
    }

    pub fn close(&mut self, id: usize) {
        self.files.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syscall::{O_RDWR, O_WRONLY};

    fn errno<T: std::fmt::Debug>(result: Result<T>) -> i32 {
        result.unwrap_err().errno
    }

    #[test]
    fn only_the_root_path_exists() {
        let mut files = OpenFiles::new();
        assert!(files.open("", O_RDONLY, 1000).is_ok());
        assert!(files.open("/", O_RDONLY, 1000).is_ok());
        assert_eq!(errno(files.open("data", O_RDONLY, 0)), ENOENT);
        assert_eq!(errno(files.open("/0", O_RDONLY, 0)), ENOENT);
    }

    #[test]
    fn writing_requires_root() {
        let mut files = OpenFiles::new();
        assert_eq!(errno(files.open("", O_WRONLY, 1000)), EACCES);
        assert_eq!(errno(files.open("", O_RDWR, 1000)), EACCES);

        let id = files.open("", O_RDWR, 0).unwrap();
        assert!(files.check_writable(id).is_ok());
        let id = files.open("", O_WRONLY, 0).unwrap();
        assert!(files.check_writable(id).is_ok());
    }

    #[test]
    fn read_only_files_reject_writes() {
        let mut files = OpenFiles::new();
        let id = files.open("", O_RDONLY, 0).unwrap();
        assert!(files.check(id).is_ok());
        assert_eq!(errno(files.check_writable(id)), EBADF);
    }

    #[test]
    fn unknown_and_closed_ids_are_bad() {
        let mut files = OpenFiles::new();
        assert_eq!(errno(files.check(0)), EBADF);

        let first = files.open("", O_RDONLY, 0).unwrap();
        let second = files.open("", O_RDONLY, 0).unwrap();
        assert_ne!(first, second);

        files.close(first);
        assert_eq!(errno(files.check(first)), EBADF);
        assert_eq!(errno(files.check_writable(first)), EBADF);
        assert!(files.check(second).is_ok());
    }
}
