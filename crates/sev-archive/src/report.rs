use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct ArchiveReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries: Vec<ExtractedEntry>,
}

#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    /// Decoded entry name, relative to the extraction root.
    pub name: String,
    pub target_path: PathBuf,
    pub size: u64,
    pub is_directory: bool,
}

impl ArchiveReport {
    pub(crate) fn record(&mut self, entry: ExtractedEntry) {
        self.entry_count += 1;
        self.total_bytes += entry.size;
        self.entries.push(entry);
    }

    pub fn files(&self) -> impl Iterator<Item = &ExtractedEntry> {
        self.entries.iter().filter(|e| !e.is_directory)
    }
}
