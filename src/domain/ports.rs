use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
    /// Removing a missing file is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn intermediate_dir(&self) -> &str;
    fn final_dir(&self) -> &str;
    fn header_token(&self) -> &str;
    fn workers(&self) -> usize;
    fn overwrite(&self) -> bool;
}

/// Turns one input line into at most one key-value pair.
///
/// `Ok(None)` is the tolerated case (header rows, short lines); an `Err`
/// aborts the stage.
pub trait Mapper: Send + Sync + 'static {
    type Key: Ord + Send + 'static;
    type Value: Send + 'static;

    fn map(&self, line_no: usize, line: &str) -> Result<Option<(Self::Key, Self::Value)>>;
}

/// Folds the complete, unordered multiset of values for one key.
///
/// Implementations must not depend on the order in which values arrive.
pub trait Reducer: Send + Sync + 'static {
    type Key: Send + 'static;
    type Value: Send + 'static;
    type Output: OutputRecord + Send + 'static;

    fn reduce<I>(&self, key: &Self::Key, values: I) -> Result<Self::Output>
    where
        I: IntoIterator<Item = Self::Value>;
}

/// A record that can be written as one tab-separated output row.
pub trait OutputRecord {
    fn to_row(&self) -> Vec<String>;
}
