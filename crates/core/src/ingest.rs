use crate::{IngestError, SourceFile, SourceKind};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

pub fn discover_source_files(folder: &Path) -> Result<Vec<SourceFile>, IngestError> {
    match fs::metadata(folder) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(IngestError::DirectoryNotFound(format!(
                "{} is not a directory",
                folder.display()
            )))
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(IngestError::DirectoryNotFound(
                folder.display().to_string(),
            ))
        }
        Err(error) => return Err(IngestError::Io(error)),
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let kind = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(SourceKind::from_extension);
        let Some(kind) = kind else {
            continue;
        };

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        files.push(SourceFile {
            name: name.to_string(),
            path: entry.path().to_path_buf(),
            kind,
        });
    }

    files.sort_unstable_by(|left, right| left.name.cmp(&right.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::discover_source_files;
    use crate::{IngestError, SourceKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovery_filters_and_sorts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        fs::write(base.join("prices.csv"), "service,price\nmassage,900\n")?;
        fs::write(base.join("about.txt"), "about the studio")?;
        fs::write(base.join("logo.png"), [0u8, 1, 2])?;
        fs::write(base.join("FAQ.TXT"), "questions")?;

        let files = discover_source_files(base)?;
        let names: Vec<_> = files.iter().map(|file| file.name.as_str()).collect();

        assert_eq!(names, vec!["FAQ.TXT", "about.txt", "prices.csv"]);
        assert_eq!(files[2].kind, SourceKind::Csv);
        assert_eq!(files[1].kind, SourceKind::Text);
        Ok(())
    }

    #[test]
    fn discovery_is_not_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("archive");
        fs::create_dir(&nested)?;
        fs::write(nested.join("old.txt"), "old")?;
        fs::write(dir.path().join("new.txt"), "new")?;

        let files = discover_source_files(dir.path())?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "new.txt");
        Ok(())
    }

    #[test]
    fn missing_directory_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope");

        let result = discover_source_files(&missing);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound(_))));
        Ok(())
    }

    #[test]
    fn file_path_is_not_a_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join("a.txt");
        fs::write(&file, "text")?;

        let result = discover_source_files(&file);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound(_))));
        Ok(())
    }
}
