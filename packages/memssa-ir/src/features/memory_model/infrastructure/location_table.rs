//! Per-procedure location table
//!
//! Interns every location the flow graph mentions, closes the set under
//! aggregate-copy mirroring and caches, for each location, the locations it
//! is not disjoint from.

use ahash::AHashMap;

use crate::features::flow_graph::domain::{Cfg, Operation};
use crate::features::memory_model::domain::{classify, AbstractLocation, LocationRoot, Overlap};
use crate::shared::models::LocId;

/// Mirrored paths longer than this are not tracked (self-nested copies)
const MAX_MIRROR_PATH: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    locations: Vec<AbstractLocation>,
    index: AHashMap<AbstractLocation, LocId>,
    /// Non-disjoint neighbours (self excluded), in id order
    neighbours: Vec<Vec<(LocId, Overlap)>>,
    /// Locations rooted at the pointee of each pointer variable
    by_pointee: AHashMap<String, Vec<LocId>>,
}

impl LocationTable {
    pub fn build(cfg: &Cfg) -> Self {
        let mut table = Self::default();
        let mut copies = Vec::new();

        for block in &cfg.blocks {
            for op in &block.ops {
                for location in op.locations() {
                    table.intern(location.clone());
                }
                if let Operation::Copy { dst, src } = op {
                    copies.push((dst, src));
                }
            }
        }

        table.close_under_copies(&copies);
        table.compute_neighbours();

        tracing::debug!(
            procedure = %cfg.name,
            locations = table.len(),
            copies = copies.len(),
            "location table built"
        );
        table
    }

    /// Intern a location, returning its id
    pub fn intern(&mut self, location: AbstractLocation) -> LocId {
        if let Some(id) = self.index.get(&location) {
            return *id;
        }
        let id = LocId::new(self.locations.len());
        if let LocationRoot::Pointee(pointer) = &location.root {
            self.by_pointee.entry(pointer.clone()).or_default().push(id);
        }
        self.index.insert(location.clone(), id);
        self.locations.push(location);
        id
    }

    /// Mirror tracked sub-locations across every copy until nothing changes
    ///
    /// After `b = a`, reading `b.x` must find a location `a.x` to copy from,
    /// and writing `a.x` later must not be confused with `b.x`.
    fn close_under_copies(&mut self, copies: &[(&AbstractLocation, &AbstractLocation)]) {
        loop {
            let before = self.locations.len();
            let mut mirrored = Vec::new();
            for location in &self.locations {
                for (dst, src) in copies {
                    if let Some(m) = location.rebase(src, dst) {
                        mirrored.push(m);
                    }
                    if let Some(m) = location.rebase(dst, src) {
                        mirrored.push(m);
                    }
                }
            }
            for location in mirrored {
                if location.path.len() <= MAX_MIRROR_PATH {
                    self.intern(location);
                }
            }
            if self.locations.len() == before {
                break;
            }
        }
    }

    fn compute_neighbours(&mut self) {
        let n = self.locations.len();
        let mut neighbours = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let overlap = classify(&self.locations[i], &self.locations[j]);
                if overlap.overlaps() {
                    neighbours[i].push((LocId::new(j), overlap));
                    neighbours[j].push((LocId::new(i), overlap));
                }
            }
        }
        for list in &mut neighbours {
            list.sort_by_key(|(id, _)| *id);
        }
        self.neighbours = neighbours;
    }

    pub fn id_of(&self, location: &AbstractLocation) -> Option<LocId> {
        self.index.get(location).copied()
    }

    pub fn location(&self, id: LocId) -> Option<&AbstractLocation> {
        self.locations.get(id.index())
    }

    pub fn neighbours(&self, id: LocId) -> &[(LocId, Overlap)] {
        self.neighbours
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Locations reached through the named pointer variable
    pub fn pointee_locations(&self, pointer: &str) -> &[LocId] {
        self.by_pointee
            .get(pointer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocId, &AbstractLocation)> + '_ {
        self.locations
            .iter()
            .enumerate()
            .map(|(index, location)| (LocId::new(index), location))
    }

    /// Ids whose display form equals `name` (e.g. `s.x`, `(*p)[0]`)
    pub fn find_by_name(&self, name: &str) -> Vec<LocId> {
        self.iter()
            .filter(|(_, location)| location.to_string() == name)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::features::flow_graph::infrastructure::build_cfg;
    use crate::features::procedure::domain::{Expr, Procedure, Stmt, StructDef, Type, TypeTable};

    fn point_types() -> TypeTable {
        TypeTable::new().with_struct(
            StructDef::new("Point")
                .field("x", Type::int())
                .field("y", Type::int()),
        )
    }

    #[test]
    fn test_copy_mirrors_fields() {
        let proc = Procedure::new("f")
            .param("a", Type::named_struct("Point"))
            .body(vec![
                Stmt::decl_init("b", Type::named_struct("Point"), Expr::var("a")),
                Stmt::ret(Expr::field(Expr::var("b"), "x")),
            ]);
        let cfg = build_cfg(&proc, &point_types(), &AnalysisConfig::default()).unwrap();
        let table = LocationTable::build(&cfg);

        assert!(table.id_of(&AbstractLocation::var("a").field("x")).is_some());
        assert!(table.id_of(&AbstractLocation::var("b").field("x")).is_some());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_copy_chains_reach_fixpoint() {
        let proc = Procedure::new("f")
            .param("a", Type::named_struct("Point"))
            .body(vec![
                Stmt::decl_init("b", Type::named_struct("Point"), Expr::var("a")),
                Stmt::decl_init("c", Type::named_struct("Point"), Expr::var("b")),
                Stmt::ret(Expr::field(Expr::var("c"), "y")),
            ]);
        let cfg = build_cfg(&proc, &point_types(), &AnalysisConfig::default()).unwrap();
        let table = LocationTable::build(&cfg);

        for root in ["a", "b", "c"] {
            assert!(
                table.id_of(&AbstractLocation::var(root).field("y")).is_some(),
                "{}.y should be tracked",
                root
            );
        }
    }

    #[test]
    fn test_neighbours_and_pointees() {
        let mut table = LocationTable::default();
        let s = table.intern(AbstractLocation::var("s"));
        let sx = table.intern(AbstractLocation::var("s").field("x"));
        let sy = table.intern(AbstractLocation::var("s").field("y"));
        let t = table.intern(AbstractLocation::var("t"));
        let p0 = table.intern(AbstractLocation::pointee("p").const_index(0));
        table.compute_neighbours();

        assert_eq!(table.intern(AbstractLocation::var("s")), s);
        assert_eq!(
            table.neighbours(sx),
            &[(s, Overlap::Total), (p0, Overlap::Partial)]
        );
        assert!(!table.neighbours(sy).iter().any(|(id, _)| *id == sx));
        assert!(!table.neighbours(t).iter().any(|(id, _)| *id == s));
        assert_eq!(table.pointee_locations("p"), &[p0]);
        assert_eq!(table.find_by_name("s.y"), vec![sy]);
    }
}
