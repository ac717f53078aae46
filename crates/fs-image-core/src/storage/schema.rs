use super::gate::StorageGate;

pub const SCAN_PARAMETER: &str = "ScanParameter";
pub const FOLDER: &str = "Folder";
pub const FILE_ENTRY: &str = "FileEntry";
pub const FILE_HASH: &str = "FileHash";
pub const HISTORY: &str = "History";

pub const SCAN_PARAMETER_COLUMNS: &str = "name text, value text";
pub const FOLDER_COLUMNS: &str =
    "id integer primary key autoincrement, path text unique, scanTime text";
pub const FILE_ENTRY_COLUMNS: &str = "id integer primary key autoincrement, \
     folderId integer references Folder(id), name text, size integer, \
     createTime text, writeTime text";
pub const FILE_HASH_COLUMNS: &str = "fileId integer primary key, hash text, calcTime text";
pub const HISTORY_COLUMNS: &str = "timestamp text, event text, msg text";

/// Tables of one file system image, `History` excluded (the gate adds it).
pub const IMAGE_TABLES: [&str; 4] = [FOLDER, FILE_ENTRY, FILE_HASH, SCAN_PARAMETER];

/// Require the image tables on `gate`. With `define` the expected schemas are
/// registered too, so a fresh store gets created; without it, `open` only
/// accepts a store that already holds an image.
pub fn declare_image_tables(gate: &mut StorageGate, define: bool) {
    gate.declare_required_tables(&IMAGE_TABLES);
    if define {
        gate.define_schema(FOLDER, FOLDER_COLUMNS);
        gate.define_schema(FILE_ENTRY, FILE_ENTRY_COLUMNS);
        gate.define_schema(FILE_HASH, FILE_HASH_COLUMNS);
        gate.define_schema(SCAN_PARAMETER, SCAN_PARAMETER_COLUMNS);
    }
}
