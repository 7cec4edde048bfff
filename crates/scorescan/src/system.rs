//! A system: a group of staves played together, with its interpretations.

use log::debug;

use scorescan_core::{identifier::InterId, shape::ShapeCategory};
use scorescan_grid::staff::StaffInfo;

use crate::sig::{Inter, SIGraph};

/// Staves of a system together with the interpretation graph of its symbols.
///
/// A system owns its staves and its graph exclusively, so distinct systems
/// can be reduced on distinct threads.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    id: usize,
    interline: i32,
    staves: Vec<StaffInfo>,
    sig: SIGraph,
}

impl SystemInfo {
    pub fn new(id: usize, interline: i32, staves: Vec<StaffInfo>) -> Self {
        Self {
            id,
            interline,
            staves,
            sig: SIGraph::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Main interline of the system, in pixels
    pub fn interline(&self) -> i32 {
        self.interline
    }

    pub fn staves(&self) -> &[StaffInfo] {
        &self.staves
    }

    pub fn staves_mut(&mut self) -> &mut [StaffInfo] {
        &mut self.staves
    }

    pub fn staff(&self, id: usize) -> Option<&StaffInfo> {
        self.staves.iter().find(|s| s.id() == id)
    }

    pub fn staff_mut(&mut self, id: usize) -> Option<&mut StaffInfo> {
        self.staves.iter_mut().find(|s| s.id() == id)
    }

    pub fn sig(&self) -> &SIGraph {
        &self.sig
    }

    pub fn sig_mut(&mut self) -> &mut SIGraph {
        &mut self.sig
    }

    /// Mutable access to both the staves and the graph
    pub(crate) fn parts_mut(&mut self) -> (&mut [StaffInfo], &mut SIGraph) {
        (&mut self.staves, &mut self.sig)
    }

    /// Inserts an inter, registering it on its staff if it is a ledger.
    pub fn add_inter(&mut self, inter: Inter) -> InterId {
        let id = self.sig.add_inter(inter);
        self.register_ledger(id);
        id
    }

    /// Registers a live ledger in the ledger map of its staff.
    ///
    /// Returns `false` if the inter is not a live ledger with a known staff
    /// and ledger index.
    pub fn register_ledger(&mut self, id: InterId) -> bool {
        let Some(inter) = self.sig.inter(id).filter(|i| !i.is_deleted()) else {
            return false;
        };
        if inter.shape().category() != ShapeCategory::Ledger {
            return false;
        }
        let (Some(staff_id), Some(index)) = (inter.staff(), inter.ledger_index()) else {
            return false;
        };
        match self.staves.iter_mut().find(|s| s.id() == staff_id) {
            Some(staff) => {
                staff.add_ledger(index, id);
                debug!(ledger:% = id, staff = staff_id, index; "Ledger registered");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use scorescan_core::{
        geometry::{Bounds, Point},
        scale::Scale,
        shape::Shape,
    };
    use scorescan_grid::{filament::LineGeometry, staff::FilamentLine};

    use super::*;

    fn staff(id: usize) -> StaffInfo {
        let lines = (0..5)
            .map(|i| {
                let y = 100.0 + 20.0 * i as f64;
                FilamentLine::from_geometry(LineGeometry::from_points(vec![
                    Point::new(0.0, y),
                    Point::new(500.0, y),
                ]))
            })
            .collect();
        StaffInfo::new(id, 0.0, 500.0, Scale::new(20, 3, 3).unwrap(), lines)
    }

    #[test]
    fn test_ledgers_are_registered() {
        let mut system = SystemInfo::new(1, 20, vec![staff(1), staff(2)]);
        let ledger = Inter::new(Shape::Ledger, 0.8, Bounds::from_rect(50.0, 199.0, 30.0, 3.0))
            .with_staff(2)
            .with_ledger_index(1);
        let id = system.add_inter(ledger);

        assert_eq!(system.staff(2).unwrap().ledgers(1), &[id]);
        assert!(system.staff(1).unwrap().ledgers(1).is_empty());
    }

    #[test]
    fn test_non_ledger_is_not_registered() {
        let mut system = SystemInfo::new(1, 20, vec![staff(1)]);
        let head = Inter::new(Shape::NoteheadBlack, 0.8, Bounds::from_rect(50.0, 95.0, 12.0, 10.0))
            .with_staff(1)
            .with_ledger_index(-1);
        let id = system.add_inter(head);

        assert!(!system.register_ledger(id));
        assert!(system.staff(1).unwrap().ledger_map().is_empty());
    }

    #[test]
    fn test_system_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SystemInfo>();
    }
}
