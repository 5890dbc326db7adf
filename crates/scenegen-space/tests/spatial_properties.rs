use proptest::prelude::*;
use scenegen_core::Vec3;
use scenegen_space::{Cell, Footprint, NavGrid, ObjectBounds, RegionKind, RoomGrid, SpatialIndex, ToolKind};

fn arb_kind() -> impl Strategy<Value = ToolKind> {
    prop_oneof![
        Just(ToolKind::Rect),
        Just(ToolKind::Hooked),
        Just(ToolKind::Isosceles),
    ]
}

proptest! {
    #[test]
    fn overlap_is_symmetric(
        ax in -5.0f64..5.0, az in -5.0f64..5.0, ar in 0.0f64..360.0,
        bx in -5.0f64..5.0, bz in -5.0f64..5.0, br in 0.0f64..360.0,
        w in 0.2f64..3.0, d in 0.2f64..3.0,
    ) {
        let a = ObjectBounds::new(Vec3::new(ax, 0.0, az), Vec3::new(w, 1.0, d), ar);
        let b = ObjectBounds::new(Vec3::new(bx, 0.0, bz), Vec3::new(d, 1.0, w), br);
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn box_always_overlaps_itself(
        x in -5.0f64..5.0, z in -5.0f64..5.0, r in 0.0f64..360.0, s in 0.1f64..4.0,
    ) {
        let a = ObjectBounds::new(Vec3::new(x, 0.0, z), Vec3::splat(s), r);
        prop_assert!(a.overlaps(&a));
    }

    #[test]
    fn four_quarter_turns_are_identity(kind in arb_kind(), len in 1u32..12) {
        let fp = Footprint::tool(kind, len).unwrap();
        let full = fp.rotated(4);
        prop_assert_eq!(full.offsets(), fp.offsets());
        let half_twice = fp.rotated(2).rotated(2);
        prop_assert_eq!(half_twice.offsets(), fp.offsets());
    }

    #[test]
    fn free_cells_never_touch_excluded_regions(
        x in 3u32..20, z in 3u32..20, lava_x in -1i32..=1, lava_z in -1i32..=1,
    ) {
        let room = RoomGrid::new(x, 3, z).unwrap();
        let mut index = SpatialIndex::new(room);
        let lava = Cell::new(lava_x, lava_z);
        index.add_region(RegionKind::Lava, [lava]).unwrap();
        let free = index.find_free_cells(&[RegionKind::Lava], 1);
        prop_assert!(!free.contains(&lava));
        prop_assert_eq!(free.len(), room.cell_count() - 1);
    }

    #[test]
    fn reachability_is_reflexive_on_open_floor(x in 2u32..30, z in 2u32..30) {
        let room = RoomGrid::new(x, 3, z).unwrap();
        let nav = NavGrid::open(room);
        for cell in room.cells() {
            prop_assert!(nav.is_reachable(cell, &[cell]));
        }
        prop_assert_eq!(nav.reachable_cells(Cell::new(0, 0)).len(), room.cell_count());
    }
}

#[test]
fn tool_pushed_across_moat_reaches_island() {
    let room = RoomGrid::new(15, 4, 15).unwrap();
    let mut index = SpatialIndex::new(room);
    let moat: Vec<Cell> = (-3..=3)
        .flat_map(|x| (1..=5).map(move |z| Cell::new(x, z)))
        .filter(|c| !(c.x == 0 && c.z == 3))
        .collect();
    index.add_region(RegionKind::Lava, moat).unwrap();
    let nav = NavGrid::from_index(&index);
    let island = Cell::new(0, 3);
    assert!(!nav.is_reachable(Cell::new(0, -4), &[island]));

    // A five-long bar parked in front of the moat, pushed five cells.
    let fp = Footprint::tool(ToolKind::Rect, 5).unwrap();
    let origin = Cell::new(0, -4);
    let mut bridged = nav.clone();
    for c in fp.pushed_cells(origin, 5) {
        bridged.unblock(c);
    }
    assert!(bridged.is_reachable(fp.push_cell(origin), &[island]));
}
