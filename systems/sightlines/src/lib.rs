#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Observer bookkeeping that keeps cell visibility counters balanced.
//!
//! The grid counts how many observers see each cell. Every observer must
//! therefore remove exactly the visibility it added, using the same origin and
//! range. [`Sightlines`] remembers where each observer stands and emits the
//! matching increase and decrease commands whenever observers appear, move or
//! leave.

use std::collections::BTreeMap;

use hexmap_core::{CellIndex, Command, Event, ObserverId};

/// Vision range of an observer unless configured otherwise.
pub const DEFAULT_VISION_RANGE: u32 = 3;

/// Position and reach of a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Observer {
    /// Cell the observer stands on.
    pub cell: CellIndex,
    /// Number of steps the observer can see.
    pub range: u32,
}

/// Pure system that pairs every visibility increase with its later decrease.
#[derive(Debug, Default)]
pub struct Sightlines {
    observers: BTreeMap<ObserverId, Observer>,
}

impl Sightlines {
    /// Creates a system without observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events, forgetting observers whose counters were lost.
    ///
    /// A rebuilt grid starts with fresh counters. A loaded map keeps the
    /// counters of the previous one, so they are reset before the observers
    /// are forgotten.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GridRebuilt { .. } => self.observers.clear(),
                Event::MapLoaded { .. } => {
                    if !self.observers.is_empty() {
                        out.push(Command::ResetVisibility);
                        self.observers.clear();
                    }
                }
                _ => {}
            }
        }
    }

    /// Registers an observer, replacing any previous registration under the
    /// same identifier.
    pub fn place(&mut self, id: ObserverId, cell: CellIndex, range: u32, out: &mut Vec<Command>) {
        if let Some(previous) = self.observers.insert(id, Observer { cell, range }) {
            out.push(Command::DecreaseVisibility {
                origin: previous.cell,
                range: previous.range,
            });
        }
        out.push(Command::IncreaseVisibility {
            origin: cell,
            range,
        });
    }

    /// Moves an observer to another cell, keeping its range.
    ///
    /// Returns `false` when the observer is unknown.
    pub fn relocate(&mut self, id: ObserverId, cell: CellIndex, out: &mut Vec<Command>) -> bool {
        let Some(observer) = self.observers.get_mut(&id) else {
            return false;
        };
        if observer.cell == cell {
            return true;
        }

        out.push(Command::DecreaseVisibility {
            origin: observer.cell,
            range: observer.range,
        });
        observer.cell = cell;
        out.push(Command::IncreaseVisibility {
            origin: cell,
            range: observer.range,
        });
        true
    }

    /// Unregisters an observer and withdraws its visibility.
    ///
    /// Returns `false` when the observer is unknown.
    pub fn remove(&mut self, id: ObserverId, out: &mut Vec<Command>) -> bool {
        let Some(observer) = self.observers.remove(&id) else {
            return false;
        };
        out.push(Command::DecreaseVisibility {
            origin: observer.cell,
            range: observer.range,
        });
        true
    }

    /// Looks up a registered observer.
    #[must_use]
    pub fn observer(&self, id: ObserverId) -> Option<Observer> {
        self.observers.get(&id).copied()
    }

    /// Iterates over the registered observers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (ObserverId, Observer)> + '_ {
        self.observers
            .iter()
            .map(|(id, observer)| (*id, *observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_decreases_before_increasing() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        let id = ObserverId::new(7);

        sightlines.place(id, CellIndex::new(3), DEFAULT_VISION_RANGE, &mut commands);
        commands.clear();

        assert!(sightlines.relocate(id, CellIndex::new(4), &mut commands));
        assert_eq!(
            commands,
            vec![
                Command::DecreaseVisibility {
                    origin: CellIndex::new(3),
                    range: DEFAULT_VISION_RANGE,
                },
                Command::IncreaseVisibility {
                    origin: CellIndex::new(4),
                    range: DEFAULT_VISION_RANGE,
                },
            ]
        );
    }

    #[test]
    fn relocating_in_place_emits_nothing() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        let id = ObserverId::new(1);
        sightlines.place(id, CellIndex::new(3), 2, &mut commands);
        commands.clear();

        assert!(sightlines.relocate(id, CellIndex::new(3), &mut commands));
        assert!(commands.is_empty());
    }

    #[test]
    fn replacing_an_observer_withdraws_its_old_sight() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        let id = ObserverId::new(1);
        sightlines.place(id, CellIndex::new(3), 2, &mut commands);
        commands.clear();

        sightlines.place(id, CellIndex::new(9), 1, &mut commands);
        assert_eq!(
            commands,
            vec![
                Command::DecreaseVisibility {
                    origin: CellIndex::new(3),
                    range: 2,
                },
                Command::IncreaseVisibility {
                    origin: CellIndex::new(9),
                    range: 1,
                },
            ]
        );
    }

    #[test]
    fn unknown_observers_are_ignored() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        assert!(!sightlines.relocate(ObserverId::new(2), CellIndex::new(0), &mut commands));
        assert!(!sightlines.remove(ObserverId::new(2), &mut commands));
        assert!(commands.is_empty());
    }

    #[test]
    fn rebuilds_forget_observers_without_commands() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        sightlines.place(ObserverId::new(1), CellIndex::new(0), 1, &mut commands);
        commands.clear();

        sightlines.handle(
            &[Event::GridRebuilt {
                width: 10,
                height: 10,
            }],
            &mut commands,
        );
        assert!(commands.is_empty());
        assert_eq!(sightlines.iter().count(), 0);
    }

    #[test]
    fn loads_reset_visibility_before_forgetting_observers() {
        let mut sightlines = Sightlines::new();
        let mut commands = Vec::new();
        sightlines.place(ObserverId::new(1), CellIndex::new(0), 1, &mut commands);
        commands.clear();

        sightlines.handle(
            &[Event::MapLoaded {
                width: 10,
                height: 10,
            }],
            &mut commands,
        );
        assert_eq!(commands, vec![Command::ResetVisibility]);
        assert_eq!(sightlines.observer(ObserverId::new(1)), None);
    }
}
