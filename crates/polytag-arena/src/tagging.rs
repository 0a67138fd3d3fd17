use serde::{Deserialize, Serialize};

use polytag_core::player::PlayerId;

/// What one contact check did to the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Transferred { from: PlayerId, to: PlayerId },
    /// Contact while armed, but the target's shield held.
    Blocked { tagger: PlayerId, shielded: PlayerId },
}

/// Who is "it", plus the debounce that limits a tag to one per contact.
///
/// `can_tag` disarms on the first overlapping tick of a contact, whether or
/// not the tag went through, and re-arms on the first tick without overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagState {
    pub tagger: PlayerId,
    pub can_tag: bool,
}

impl TagState {
    /// Starts disarmed so players spawned in contact cannot swap on tick one.
    pub fn new(tagger: PlayerId) -> Self {
        Self {
            tagger,
            can_tag: false,
        }
    }

    /// The player the tagger is chasing.
    pub fn target(&self) -> PlayerId {
        self.tagger.opponent()
    }

    pub fn update(&mut self, overlapping: bool, target_shielded: bool) -> Option<TagOutcome> {
        if !overlapping {
            self.can_tag = true;
            return None;
        }
        if !self.can_tag {
            return None;
        }
        self.can_tag = false;

        let from = self.tagger;
        let to = self.target();
        if target_shielded {
            return Some(TagOutcome::Blocked {
                tagger: from,
                shielded: to,
            });
        }
        self.tagger = to;
        Some(TagOutcome::Transferred { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed(tagger: PlayerId) -> TagState {
        let mut tag = TagState::new(tagger);
        tag.update(false, false);
        tag
    }

    #[test]
    fn starts_disarmed() {
        let mut tag = TagState::new(PlayerId::One);
        assert!(!tag.can_tag);
        assert_eq!(tag.update(true, false), None);
        assert_eq!(tag.tagger, PlayerId::One);
    }

    #[test]
    fn contact_transfers_once() {
        let mut tag = armed(PlayerId::One);
        assert_eq!(
            tag.update(true, false),
            Some(TagOutcome::Transferred {
                from: PlayerId::One,
                to: PlayerId::Two
            })
        );
        assert!(!tag.can_tag);

        // Continued contact does nothing.
        for _ in 0..30 {
            assert_eq!(tag.update(true, false), None);
        }
        assert_eq!(tag.tagger, PlayerId::Two);
    }

    #[test]
    fn separation_rearms() {
        let mut tag = armed(PlayerId::One);
        tag.update(true, false);
        tag.update(false, false);
        assert!(tag.can_tag);
        tag.update(true, false);
        assert_eq!(tag.tagger, PlayerId::One, "tagged back");
    }

    #[test]
    fn shield_blocks_but_still_disarms() {
        let mut tag = armed(PlayerId::Two);
        assert_eq!(
            tag.update(true, true),
            Some(TagOutcome::Blocked {
                tagger: PlayerId::Two,
                shielded: PlayerId::One
            })
        );
        assert_eq!(tag.tagger, PlayerId::Two);
        assert!(!tag.can_tag);

        // Shield dropping mid-contact does not reopen the tag.
        assert_eq!(tag.update(true, false), None);
        assert_eq!(tag.tagger, PlayerId::Two);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn debounce_holds_for_any_contact_sequence(
                contacts in prop::collection::vec((any::<bool>(), any::<bool>()), 1..200),
            ) {
                let mut tag = TagState::new(PlayerId::One);
                let mut flips_this_episode = 0;
                let mut prev_overlap = false;
                for (overlap, shielded) in contacts {
                    let was_armed = tag.can_tag;
                    let before = tag.tagger;
                    tag.update(overlap, shielded);

                    if overlap && !prev_overlap {
                        flips_this_episode = 0;
                    }
                    if tag.tagger != before {
                        flips_this_episode += 1;
                    }
                    prop_assert!(flips_this_episode <= 1);

                    if !was_armed && tag.can_tag {
                        prop_assert!(!overlap, "arms only on a non-overlapping tick");
                    }
                    if was_armed && !tag.can_tag {
                        prop_assert!(overlap, "disarms only on an overlapping tick");
                    }
                    prev_overlap = overlap;
                }
            }
        }
    }
}
