//! Pre-provisioned containers on cabinet shelves.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use stockroom_core::{ContainerId, DomainError, DomainResult, Entity};

/// Container codes use one letter per slot within a cabinet.
const CODE_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Physical shape of the cabinet grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetLayout {
    pub cabinets: u32,
    pub shelves_per_cabinet: u32,
    pub containers_per_shelf: u32,
}

impl Default for CabinetLayout {
    fn default() -> Self {
        Self {
            cabinets: 3,
            shelves_per_cabinet: 5,
            containers_per_shelf: 4,
        }
    }
}

impl CabinetLayout {
    pub fn validate(&self) -> DomainResult<()> {
        if self.cabinets == 0 {
            return Err(DomainError::validation("cabinets must be at least 1"));
        }
        if self.shelves_per_cabinet == 0 {
            return Err(DomainError::validation("shelves_per_cabinet must be at least 1"));
        }
        if self.containers_per_shelf == 0 {
            return Err(DomainError::validation("containers_per_shelf must be at least 1"));
        }
        let per_cabinet = u64::from(self.shelves_per_cabinet) * u64::from(self.containers_per_shelf);
        if per_cabinet > CODE_LETTERS.len() as u64 {
            return Err(DomainError::validation(format!(
                "{per_cabinet} containers per cabinet exceeds the {} available code letters",
                CODE_LETTERS.len()
            )));
        }
        Ok(())
    }

    pub fn has_cabinet(&self, cabinet_number: u32) -> bool {
        (1..=self.cabinets).contains(&cabinet_number)
    }

    /// Shelf 0 means "not on a shelf" and is always valid.
    pub fn has_shelf(&self, shelf_number: u32) -> bool {
        shelf_number <= self.shelves_per_cabinet
    }
}

/// A compartment on a specific cabinet shelf, identified by a code such as "A1".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub code: String,
    pub cabinet_number: u32,
    pub shelf_number: u32,
}

impl Entity for Container {
    type Id = ContainerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lookup over the fixed set of provisioned containers.
#[derive(Debug, Clone)]
pub struct ContainerDirectory {
    layout: CabinetLayout,
    by_id: HashMap<ContainerId, Container>,
    by_code: BTreeMap<String, ContainerId>,
}

impl ContainerDirectory {
    /// Provision one container per (cabinet, shelf, slot) of `layout`.
    ///
    /// Letters run across the whole cabinet (shelf 1 gets the first
    /// `containers_per_shelf` letters, and so on) and the cabinet number is
    /// appended: with the default layout cabinet 2 holds `A2`..`T2`.
    pub fn provision(layout: CabinetLayout) -> DomainResult<Self> {
        layout.validate()?;

        let mut by_id = HashMap::new();
        let mut by_code = BTreeMap::new();

        for cabinet_number in 1..=layout.cabinets {
            let mut slot = 0usize;
            for shelf_number in 1..=layout.shelves_per_cabinet {
                for _ in 0..layout.containers_per_shelf {
                    let code = format!("{}{}", CODE_LETTERS[slot] as char, cabinet_number);
                    let container = Container {
                        id: ContainerId::new(),
                        code: code.clone(),
                        cabinet_number,
                        shelf_number,
                    };
                    by_code.insert(code, container.id);
                    by_id.insert(container.id, container);
                    slot += 1;
                }
            }
        }

        Ok(Self {
            layout,
            by_id,
            by_code,
        })
    }

    pub fn layout(&self) -> &CabinetLayout {
        &self.layout
    }

    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.by_id.get(&id)
    }

    pub fn by_code(&self, code: &str) -> Option<&Container> {
        self.by_code
            .get(&code.trim().to_ascii_uppercase())
            .and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All containers, ordered by code.
    pub fn list(&self) -> Vec<&Container> {
        self.by_code.values().filter_map(|id| self.by_id.get(id)).collect()
    }

    /// Containers on one shelf of one cabinet, ordered by code.
    pub fn on_shelf(&self, cabinet_number: u32, shelf_number: u32) -> Vec<&Container> {
        self.list()
            .into_iter()
            .filter(|c| c.cabinet_number == cabinet_number && c.shelf_number == shelf_number)
            .collect()
    }
}
