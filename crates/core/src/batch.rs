use crate::SourceFile;

pub fn batch_count(file_count: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    file_count.div_ceil(batch_size)
}

pub fn plan_batch(files: &[SourceFile], batch_index: usize, batch_size: usize) -> &[SourceFile] {
    let start = batch_index.saturating_mul(batch_size).min(files.len());
    let end = start.saturating_add(batch_size).min(files.len());
    &files[start..end]
}

pub fn unplanned_files(
    files: &[SourceFile],
    total_batches: usize,
    batch_size: usize,
) -> &[SourceFile] {
    let covered = total_batches.saturating_mul(batch_size).min(files.len());
    &files[covered..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;
    use std::path::PathBuf;

    fn files(count: usize) -> Vec<SourceFile> {
        (0..count)
            .map(|index| SourceFile {
                name: format!("{index:02}.txt"),
                path: PathBuf::from(format!("{index:02}.txt")),
                kind: SourceKind::Text,
            })
            .collect()
    }

    #[test]
    fn batch_count_rounds_up() {
        assert_eq!(batch_count(0, 3), 0);
        assert_eq!(batch_count(3, 3), 1);
        assert_eq!(batch_count(7, 3), 3);
        assert_eq!(batch_count(9, 3), 3);
        assert_eq!(batch_count(5, 0), 0);
    }

    #[test]
    fn batches_cover_every_file_once() {
        for count in 0..12 {
            for size in 1..5 {
                let all = files(count);
                let batches = batch_count(count, size);
                let mut seen = Vec::new();
                for index in 0..batches {
                    let slice = plan_batch(&all, index, size);
                    assert!(!slice.is_empty());
                    seen.extend(slice.iter().map(|file| file.name.clone()));
                }
                let expected: Vec<_> = all.iter().map(|file| file.name.clone()).collect();
                assert_eq!(seen, expected);

                if batches > 0 {
                    let last = plan_batch(&all, batches - 1, size).len();
                    let remainder = count % size;
                    assert_eq!(last, if remainder == 0 { size } else { remainder });
                }
            }
        }
    }

    #[test]
    fn index_past_the_end_is_empty() {
        let all = files(4);
        assert_eq!(plan_batch(&all, 1, 3).len(), 1);
        assert!(plan_batch(&all, 2, 3).is_empty());
        assert!(plan_batch(&all, usize::MAX, 3).is_empty());
    }

    #[test]
    fn short_plan_leaves_trailing_files() {
        let all = files(8);
        let skipped = unplanned_files(&all, 2, 3);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].name, "06.txt");
        assert!(unplanned_files(&all, 3, 3).is_empty());
        assert!(unplanned_files(&all, 5, 3).is_empty());
    }
}
