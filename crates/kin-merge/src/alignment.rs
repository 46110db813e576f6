//! Pairing of casualty parents with survivor parent slots.

use kin_types::{Family, Handle};
use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};

/// One of the two parent slots of a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentSlot {
    Father,
    Mother,
}

impl ParentSlot {
    pub const BOTH: [ParentSlot; 2] = [ParentSlot::Father, ParentSlot::Mother];

    pub fn get(self, family: &Family) -> Option<Handle> {
        match self {
            ParentSlot::Father => family.father,
            ParentSlot::Mother => family.mother,
        }
    }

    pub fn set(self, family: &mut Family, person: Handle) {
        match self {
            ParentSlot::Father => family.father = Some(person),
            ParentSlot::Mother => family.mother = Some(person),
        }
    }
}

/// Which survivor slot each casualty parent lands in.
///
/// `father_swapped` sends the casualty father to the survivor's mother slot;
/// `mother_swapped` sends the casualty mother to the survivor's father slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAlignment {
    pub father_swapped: bool,
    pub mother_swapped: bool,
}

impl SlotAlignment {
    pub const STRAIGHT: SlotAlignment = SlotAlignment {
        father_swapped: false,
        mother_swapped: false,
    };

    pub const CROSSED: SlotAlignment = SlotAlignment {
        father_swapped: true,
        mother_swapped: true,
    };

    /// Crossed when some parent is shared in opposite slots and none is
    /// shared in the same slot; straight otherwise.
    pub fn detect(survivor: &Family, casualty: &Family) -> Self {
        let same = |a: Option<Handle>, b: Option<Handle>| matches!((a, b), (Some(x), Some(y)) if x == y);
        let same_slot = same(survivor.father, casualty.father) || same(survivor.mother, casualty.mother);
        let opposite_slot =
            same(survivor.father, casualty.mother) || same(survivor.mother, casualty.father);
        if opposite_slot && !same_slot {
            Self::CROSSED
        } else {
            Self::STRAIGHT
        }
    }

    pub fn is_straight(&self) -> bool {
        *self == Self::STRAIGHT
    }

    /// The casualty parent that lands in survivor `slot`, if any.
    ///
    /// Fails with [`MergeError::InvalidAlignment`] when both casualty parents
    /// land in the same slot.
    pub fn casualty_for(&self, slot: ParentSlot, casualty: &Family) -> MergeResult<Option<Handle>> {
        let father_target = if self.father_swapped {
            ParentSlot::Mother
        } else {
            ParentSlot::Father
        };
        let mother_target = if self.mother_swapped {
            ParentSlot::Father
        } else {
            ParentSlot::Mother
        };
        let from_father = casualty.father.filter(|_| father_target == slot);
        let from_mother = casualty.mother.filter(|_| mother_target == slot);
        match (from_father, from_mother) {
            (Some(_), Some(_)) => Err(MergeError::InvalidAlignment {
                family: casualty.handle,
            }),
            (found, None) | (None, found) => Ok(found),
        }
    }

    /// Fail early if this alignment is unusable for `casualty`.
    pub fn validate(&self, casualty: &Family) -> MergeResult<()> {
        for slot in ParentSlot::BOTH {
            self.casualty_for(slot, casualty)?;
        }
        Ok(())
    }
}
