use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use voctree_core::error::{Error, Result};
use voctree_core::traits::Quantizer;
use voctree_core::types::{Descriptor, Word, DESCRIPTOR_DIM};

/// Vocabulary tree with `splits` children per node and `levels` levels.
///
/// Centers are stored breadth-first without the root: the children of node
/// `n` live at `(n + 1) * splits ..`, the root's children at `0 .. splits`.
/// The last `splits^levels` centers are the leaves, i.e. the visual words.
#[derive(Debug, Clone)]
pub struct VocabularyTree {
    splits: u32,
    levels: u32,
    centers: Vec<Descriptor>,
    valid: Vec<bool>,
    num_words: usize,
    word_start: usize,
}

fn expected_centers(splits: u32, levels: u32) -> Option<(usize, usize)> {
    let k = splits as usize;
    let mut total = 0usize;
    let mut level_size = 1usize;
    for _ in 0..levels {
        level_size = level_size.checked_mul(k)?;
        total = total.checked_add(level_size)?;
    }
    Some((total, level_size))
}

impl VocabularyTree {
    pub fn from_parts(splits: u32, levels: u32, centers: Vec<Descriptor>, valid: Vec<bool>) -> Result<Self> {
        if splits == 0 || levels == 0 {
            return Err(Error::InvalidConfig(format!(
                "vocabulary tree needs at least one level and one split (got {} levels, {} splits)",
                levels, splits
            )));
        }
        let (total, num_words) = expected_centers(splits, levels)
            .ok_or_else(|| Error::InvalidConfig(format!("{} levels of {} splits overflow", levels, splits)))?;
        if centers.len() != total || valid.len() != total {
            return Err(Error::InvalidConfig(format!(
                "expected {} centers for {} levels of {} splits, got {} centers and {} flags",
                total,
                levels,
                splits,
                centers.len(),
                valid.len()
            )));
        }
        Ok(Self { splits, levels, centers, valid, num_words, word_start: total - num_words })
    }

    /// Load a tree: `u32 splits`, `u32 levels`, `u32 center count`, the
    /// centers as little-endian `f32`, then one validity byte per center.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = BufReader::new(file);
        let read_u32 = |reader: &mut BufReader<File>| -> Result<u32> {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf).map_err(|e| Error::io(path, e))?;
            Ok(u32::from_le_bytes(buf))
        };
        let splits = read_u32(&mut reader)?;
        let levels = read_u32(&mut reader)?;
        let count = read_u32(&mut reader)? as usize;
        match expected_centers(splits, levels) {
            Some((total, _)) if total == count => {}
            _ => {
                return Err(Error::parse(
                    path,
                    format!("{} centers do not fit {} levels of {} splits", count, levels, splits),
                ))
            }
        }

        // Grows with the data actually read, not with the header.
        let mut centers = Vec::new();
        let mut chunk = [0u8; DESCRIPTOR_DIM * 4];
        for _ in 0..count {
            reader.read_exact(&mut chunk).map_err(|e| Error::io(path, e))?;
            let mut center = [0f32; DESCRIPTOR_DIM];
            for (value, bytes) in center.iter_mut().zip(chunk.chunks_exact(4)) {
                *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            centers.push(center);
        }

        let mut flags = vec![0u8; count];
        reader.read_exact(&mut flags).map_err(|e| Error::io(path, e))?;
        let valid = flags.into_iter().map(|b| b != 0).collect();

        let tree = Self::from_parts(splits, levels, centers, valid).map_err(|e| Error::parse(path, e.to_string()))?;
        tracing::debug!(path = %path.display(), splits, levels, words = tree.num_words, "vocabulary tree read");
        Ok(tree)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut write = |bytes: &[u8]| writer.write_all(bytes).map_err(|e| Error::io(path, e));
        write(&self.splits.to_le_bytes())?;
        write(&self.levels.to_le_bytes())?;
        write(&(self.centers.len() as u32).to_le_bytes())?;
        for center in &self.centers {
            for value in center {
                write(&value.to_le_bytes())?;
            }
        }
        for &flag in &self.valid {
            write(&[u8::from(flag)])?;
        }
        writer.flush().map_err(|e| Error::io(path, e))
    }
}

fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Quantizer for VocabularyTree {
    fn quantize(&self, descriptor: &Descriptor) -> Word {
        let k = self.splits as usize;
        // None is the virtual root, which has no center of its own.
        let mut node: Option<usize> = None;
        for _ in 0..self.levels {
            let first_child = node.map_or(0, |n| (n + 1) * k);
            let mut best_child = first_child;
            let mut best_distance = f32::MAX;
            for child in first_child..first_child + k {
                // fewer than `splits` children below this node
                if !self.valid[child] {
                    break;
                }
                let distance = squared_distance(descriptor, &self.centers[child]);
                if distance < best_distance {
                    best_child = child;
                    best_distance = distance;
                }
            }
            node = Some(best_child);
        }
        (node.unwrap_or(self.word_start) - self.word_start) as Word
    }

    fn levels(&self) -> u32 {
        self.levels
    }

    fn splits(&self) -> u32 {
        self.splits
    }

    fn words(&self) -> usize {
        self.num_words
    }
}
