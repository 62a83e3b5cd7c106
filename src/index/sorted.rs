//! Sorted file index implementation.
//!
//! Lookups binary-search the file, decoding one key per probe. Inserting a
//! key that is not the new maximum shifts every later record one slot to
//! the right, so non-append inserts cost O(n) record rewrites.
//!
//! The index does no locking of its own; callers sharing one must serialize
//! access themselves.

use super::{FixedWidth, KeyValueStore};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A persistent map from fixed-width keys to fixed-width values.
///
/// Usage:
/// ```no_run
/// use lexwire::index::SortedFileIndex;
///
/// let mut index = SortedFileIndex::<i64, i64>::open("ids.idx").unwrap();
/// index.put(100, 7).unwrap();
/// assert_eq!(index.get(&100).unwrap(), Some(7));
/// ```
#[derive(Debug)]
pub struct SortedFileIndex<K, V> {
    path: PathBuf,
    file: File,
    entry_count: u64,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SortedFileIndex<K, V>
where
    K: FixedWidth + Ord,
    V: FixedWidth,
{
    /// Size of one record in bytes.
    pub const RECORD_SIZE: usize = K::WIDTH + V::WIDTH;

    /// Open or create an index file.
    ///
    /// The entry count is derived from the file length. A length that is not
    /// a whole number of records is rejected.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if Self::RECORD_SIZE == 0 {
            return Err(Error::configuration("index records must not be empty"));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(Error::Storage)?;

        let file_len = file.metadata().map_err(Error::Storage)?.len();
        let record_size = Self::RECORD_SIZE as u64;
        if file_len % record_size != 0 {
            return Err(Error::decode(format!(
                "index file {:?} has {} bytes, not a multiple of record size {}",
                path, file_len, record_size
            )));
        }

        let entry_count = file_len / record_size;
        log::debug!("Opened sorted index {:?} with {} entries", path, entry_count);

        Ok(Self { path, file, entry_count, _marker: PhantomData })
    }

    /// Number of records.
    pub fn len(&self) -> u64 {
        self.entry_count
    }

    /// Returns true if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the key of record `index`.
    pub fn get_key(&mut self, index: u64) -> Result<K> {
        let record = self.read_record(index)?;
        K::read_from(&mut &record[..K::WIDTH])
    }

    /// Decode the value of record `index`.
    pub fn get_value(&mut self, index: u64) -> Result<V> {
        let record = self.read_record(index)?;
        V::read_from(&mut &record[K::WIDTH..])
    }

    /// Binary search for `key`.
    ///
    /// Returns `Ok(index)` when found, or `Err(insertion_point)` where the
    /// key would have to be inserted to keep the records sorted.
    pub fn search(&mut self, key: &K) -> Result<std::result::Result<u64, u64>> {
        let mut low = 0;
        let mut high = self.entry_count;

        while low < high {
            let mid = low + (high - low) / 2;
            match self.get_key(mid)?.cmp(key) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(Ok(mid)),
            }
        }
        Ok(Err(low))
    }

    /// Look up the value stored for `key`.
    pub fn get(&mut self, key: &K) -> Result<Option<V>> {
        match self.search(key)? {
            Ok(index) => self.get_value(index).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Store `value` under `key`, returning the value it replaced.
    ///
    /// An existing key is overwritten in place. A new key is inserted at its
    /// sorted position after shifting every later record one slot right.
    /// Key and value are encoded before anything is written, so an encoding
    /// error leaves the index unchanged.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.search(&key)? {
            Ok(index) => {
                let previous = self.get_value(index)?;
                self.write_value(index, &value)?;
                Ok(Some(previous))
            }
            Err(insert_at) => {
                let record = Self::encode_record(&key, &value)?;
                let shifted = self.entry_count - insert_at;
                if shifted > 0 {
                    log::trace!("Shifting {} records in {:?}", shifted, self.path);
                }

                // back to front so no record is overwritten before it is read
                let mut index = self.entry_count;
                while index > insert_at {
                    index -= 1;
                    let record = self.read_record(index)?;
                    self.write_at(index + 1, &record)?;
                }

                self.write_at(insert_at, &record)?;
                self.entry_count += 1;
                Ok(None)
            }
        }
    }

    /// The largest key, or `None` if the index is empty.
    pub fn max_key(&mut self) -> Result<Option<K>> {
        if self.entry_count == 0 {
            return Ok(None);
        }
        self.get_key(self.entry_count - 1).map(Some)
    }

    /// Iterate over all records in key order.
    pub fn iter(&mut self) -> Entries<'_, K, V> {
        Entries { index: self, next: 0 }
    }

    /// Flush file contents to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush().map_err(Error::Storage)?;
        self.file.sync_all().map_err(Error::Storage)
    }

    fn offset(index: u64) -> u64 {
        index * Self::RECORD_SIZE as u64
    }

    fn read_record(&mut self, index: u64) -> Result<Vec<u8>> {
        if index >= self.entry_count {
            return Err(Error::invalid_argument(format!(
                "record {} out of range ({} entries)",
                index, self.entry_count
            )));
        }

        let mut record = vec![0u8; Self::RECORD_SIZE];
        self.file.seek(SeekFrom::Start(Self::offset(index))).map_err(Error::Storage)?;
        self.file.read_exact(&mut record).map_err(Error::Storage)?;
        Ok(record)
    }

    fn write_at(&mut self, index: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(index))).map_err(Error::Storage)?;
        self.file.write_all(data).map_err(Error::Storage)
    }

    fn encode_record(key: &K, value: &V) -> Result<BytesMut> {
        let mut writer = BytesMut::with_capacity(Self::RECORD_SIZE).writer();
        key.write_to(&mut writer).map_err(Error::into_storage)?;
        value.write_to(&mut writer).map_err(Error::into_storage)?;
        let record = writer.into_inner();
        debug_assert_eq!(record.len(), Self::RECORD_SIZE);
        Ok(record)
    }

    fn write_value(&mut self, index: u64, value: &V) -> Result<()> {
        let mut writer = BytesMut::with_capacity(V::WIDTH).writer();
        value.write_to(&mut writer).map_err(Error::into_storage)?;
        let encoded = writer.into_inner();

        let offset = Self::offset(index) + K::WIDTH as u64;
        self.file.seek(SeekFrom::Start(offset)).map_err(Error::Storage)?;
        self.file.write_all(&encoded).map_err(Error::Storage)
    }
}

impl<K, V> KeyValueStore<K, V> for SortedFileIndex<K, V>
where
    K: FixedWidth + Ord,
    V: FixedWidth,
{
    fn get(&mut self, key: &K) -> Result<Option<V>> {
        SortedFileIndex::get(self, key)
    }

    fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        SortedFileIndex::put(self, key, value)
    }
}

/// Iterator over the records of a [`SortedFileIndex`] in key order.
pub struct Entries<'a, K, V> {
    index: &'a mut SortedFileIndex<K, V>,
    next: u64,
}

impl<K, V> Iterator for Entries<'_, K, V>
where
    K: FixedWidth + Ord,
    V: FixedWidth,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.index.len() {
            return None;
        }
        let position = self.next;
        self.next += 1;

        let entry = self.index.read_record(position).and_then(|record| {
            let key = K::read_from(&mut &record[..K::WIDTH])?;
            let value = V::read_from(&mut &record[K::WIDTH..])?;
            Ok((key, value))
        });
        Some(entry)
    }
}
