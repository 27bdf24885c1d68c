//! Held-note tracking and strum ladder construction

/// A note held on the input, or a transposed copy of one on the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldNote {
    pub pitch: u8,
    pub velocity: u8,
}

/// Currently held notes, unique by pitch and kept in ascending pitch order
#[derive(Debug, Clone, Default)]
pub struct ActiveNoteSet {
    notes: Vec<HeldNote>,
}

impl ActiveNoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note. A pitch that is already held is left as it is.
    pub fn add(&mut self, pitch: u8, velocity: u8) -> bool {
        match self.notes.binary_search_by_key(&pitch, |n| n.pitch) {
            Ok(_) => false,
            Err(pos) => {
                self.notes.insert(pos, HeldNote { pitch, velocity });
                true
            }
        }
    }

    /// Release a pitch. Releasing a pitch that is not held does nothing.
    pub fn remove(&mut self, pitch: u8) -> bool {
        match self.notes.binary_search_by_key(&pitch, |n| n.pitch) {
            Ok(pos) => {
                self.notes.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn sorted(&self) -> &[HeldNote] {
        &self.notes
    }

    pub fn pitches(&self) -> Vec<u8> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

/// Stack `steps + 1` copies of the held chord, each `semitones_per_step`
/// above the previous one. Pitches past 127 are pinned to 127 so the ladder
/// always holds `(steps + 1) * notes.len()` entries.
pub fn build_ladder(notes: &[HeldNote], steps: u32, semitones_per_step: u32) -> Vec<HeldNote> {
    let mut ladder = Vec::with_capacity(notes.len() * (steps as usize + 1));
    for layer in 0..=steps {
        let offset = layer * semitones_per_step;
        for note in notes {
            let pitch = (note.pitch as u32 + offset).min(127) as u8;
            ladder.push(HeldNote { pitch, ..*note });
        }
    }
    ladder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(ladder: &[HeldNote]) -> Vec<u8> {
        ladder.iter().map(|n| n.pitch).collect()
    }

    #[test]
    fn test_add_then_remove() {
        let mut set = ActiveNoteSet::new();
        set.add(60, 100);
        set.add(64, 100);
        set.remove(60);
        assert_eq!(set.pitches(), vec![64]);
    }

    #[test]
    fn test_kept_sorted_and_unique() {
        let mut set = ActiveNoteSet::new();
        assert!(set.add(67, 90));
        assert!(set.add(60, 80));
        assert!(set.add(64, 70));
        assert!(!set.add(60, 127));
        assert_eq!(set.pitches(), vec![60, 64, 67]);
        assert_eq!(set.sorted()[0].velocity, 80);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut set = ActiveNoteSet::new();
        set.add(60, 100);
        assert!(!set.remove(61));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ladder_layers() {
        let mut set = ActiveNoteSet::new();
        set.add(64, 100);
        set.add(60, 100);
        let ladder = build_ladder(set.sorted(), 1, 12);
        assert_eq!(pitches(&ladder), vec![60, 64, 72, 76]);
    }

    #[test]
    fn test_ladder_length_and_empty() {
        let notes = [HeldNote { pitch: 48, velocity: 1 }, HeldNote { pitch: 55, velocity: 1 }];
        assert_eq!(build_ladder(&notes, 3, 7).len(), 8);
        assert!(build_ladder(&[], 5, 12).is_empty());
    }

    #[test]
    fn test_ladder_pins_top_pitch() {
        let notes = [HeldNote { pitch: 120, velocity: 64 }];
        assert_eq!(pitches(&build_ladder(&notes, 2, 12)), vec![120, 127, 127]);
    }
}
