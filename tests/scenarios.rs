//! End-to-end scenarios: grid conversion, multi-tile mosaics, hole repair.

use std::io::Cursor;

use lidar_ply::holes;
use lidar_ply::lidar::{import_grid, import_tiles, read_list_from_path, Grid, Offsets};
use lidar_ply::parser::Parser;
use lidar_ply::writer::Writer;
use lidar_ply::{Format, Ply, PointCloudBuilder};

fn parse(text: &str) -> Ply {
    Parser::new().read_ply(&mut text.as_bytes()).unwrap()
}

#[test]
fn grid_with_nodata_centre() {
    // 3x3 grid whose centre cell is NODATA
    let text = "ncols 3\nnrows 3\nxllcorner 0\nyllcorner 0\ncellsize 1\n\
                NODATA_value -9999\n\
                0 1 0\n1 -9999 1\n0 1 0\n";
    let grid = Grid::read(&mut Cursor::new(text.as_bytes())).unwrap();

    let mut builder = PointCloudBuilder::new();
    import_grid(&mut builder, &grid, None, Offsets::default(), false).unwrap();
    assert_eq!(builder.ply().vertex_count(), 8);

    let mut builder = PointCloudBuilder::new();
    import_grid(&mut builder, &grid, None, Offsets::default(), true).unwrap();
    let ply = builder.into_ply();
    assert_eq!(ply.vertex_count(), 8);
    // every 2x2 block touches the missing centre; only the two triangles
    // that avoid it survive
    assert_eq!(ply.face_count(), 2);
    let vertex = ply.element("vertex").unwrap().as_fixed().unwrap();
    for row in 0..ply.vertex_count() {
        assert_eq!(vertex.get(row, "red").unwrap(), "128");
        assert_eq!(vertex.get(row, "green").unwrap(), "128");
        assert_eq!(vertex.get(row, "blue").unwrap(), "128");
    }
}

#[test]
fn converted_grid_survives_binary_round_trip() {
    let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n\
                NODATA_value -9999\n\
                1 2\n3 4\n";
    let grid = Grid::read(&mut Cursor::new(text.as_bytes())).unwrap();
    let mut builder = PointCloudBuilder::new();
    import_grid(&mut builder, &grid, None, Offsets::default(), true).unwrap();
    let mut ply = builder.into_ply();
    ply.set_format(Format::BinaryLittleEndian);

    let mut bytes = Vec::new();
    Writer::new().write_ply(&mut bytes, &ply).unwrap();
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let back = Parser::new().read_ply(&mut reader).unwrap();
    assert_eq!(back.vertex_count(), 4);
    assert_eq!(back.face_count(), 2);
    // southern row comes first: file row "3 4" is the southern edge
    let c = back.vertex_coords(0).unwrap();
    assert_eq!((c.x, c.y, c.z), (0.0, 0.0, 3.0));
}

#[test]
fn two_tile_mosaic_abuts_without_overlap() {
    // tiles at xllcorner 0 and 2, cellsize 1, 2 columns each
    let records = read_list_from_path("data/tiles.txt").unwrap();
    assert_eq!(records.len(), 2);
    let mut builder = PointCloudBuilder::new();
    import_tiles(&mut builder, &records, 0.0, false).unwrap();
    let ply = builder.into_ply();
    assert_eq!(ply.vertex_count(), 8);
    let b = ply.bounding_box().unwrap();
    assert_eq!((b.min.x, b.max.x), (0.0, 3.0));
    assert_eq!((b.min.y, b.max.y), (0.0, 1.0));

    // columns 0..4 each carry two vertices: no gap, no overlap
    let mut column_counts = [0u32; 4];
    for i in 0..ply.vertex_count() {
        let c = ply.vertex_coords(i).unwrap();
        column_counts[c.x as usize] += 1;
    }
    assert_eq!(column_counts, [2, 2, 2, 2]);
}

#[test]
fn quad_sheet_and_its_missing_triangle() {
    // two triangles sharing edge 1-2 leave a single rim loop
    let sheet = parse(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\nproperty float y\nproperty float z\n\
         element face 2\nproperty list uchar int vertex_index\n\
         end_header\n\
         0 0 0\n1 0 0\n0 1 0\n1 1 0\n\
         3 0 1 2\n3 1 3 2\n",
    );
    let rims = holes::find_holes(&sheet).unwrap();
    assert_eq!(rims.len(), 1);
    assert_eq!(rims[0].len(), 4);

    // dropping face (1,3,2) leaves the triangle 0-1-2 as the hole
    let open = parse(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\nproperty float y\nproperty float z\n\
         element face 1\nproperty list uchar int vertex_index\n\
         end_header\n\
         0 0 0\n1 0 0\n0 1 0\n1 1 0\n\
         3 0 1 2\n",
    );
    let loops = holes::find_holes(&open).unwrap();
    assert_eq!(loops.len(), 1);
    let mut cycle = loops[0].clone();
    cycle.sort_unstable();
    assert_eq!(cycle, vec![0, 1, 2]);
}

#[test]
fn fan_fill_closes_a_single_triangle() {
    let mut ply = parse(
        "ply\nformat ascii 1.0\n\
         element vertex 3\n\
         property float x\nproperty float y\nproperty float z\n\
         element face 1\nproperty list uchar int vertex_index\n\
         end_header\n\
         0 0 0\n1 0 0\n0 1 0\n\
         3 0 1 2\n",
    );
    let loops = holes::find_holes(&ply).unwrap();
    assert_eq!(loops.len(), 1);
    holes::fan_fill(&mut ply, &loops[0]).unwrap();
    assert_eq!(ply.vertex_count(), 4);
    assert_eq!(ply.face_count(), 4);
    assert!(holes::find_holes(&ply).unwrap().is_empty());
}

#[test]
fn cube_loaded_from_disk_is_closed_and_reencodes() {
    let mut ply = Ply::read_from_path("data/cube_ascii.ply").unwrap();
    assert!(holes::find_holes(&ply).unwrap().is_empty());
    ply.set_format(Format::BinaryBigEndian);
    let mut bytes = Vec::new();
    Writer::new().write_ply(&mut bytes, &ply).unwrap();
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let back = Parser::new().read_ply(&mut reader).unwrap();
    assert_eq!(ply.elements(), back.elements());
}

#[test]
fn base_fill_produces_a_watertight_block() {
    // open-topped square dish: 4 side quads missing their roof
    let mut ply = parse(
        "ply\nformat ascii 1.0\n\
         element vertex 5\n\
         property float x\nproperty float y\nproperty float z\n\
         element face 4\nproperty list uchar int vertex_index\n\
         end_header\n\
         0 0 2\n1 1 4\n-1 1 4\n-1 -1 4\n1 -1 4\n\
         3 0 1 2\n3 0 2 3\n3 0 3 4\n3 0 4 1\n",
    );
    let loops = holes::find_holes(&ply).unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].len(), 4);
    holes::base_fill(&mut ply, &loops[0], 50.0).unwrap();
    // 4 rim duplicates + base-fan centroid
    assert_eq!(ply.vertex_count(), 10);
    // 4 original + 4 side quads + 4 base triangles
    assert_eq!(ply.face_count(), 12);
    // rim z_min 4, model height 2, 50% extrusion puts the base at 3
    let base_rim = ply.vertex_coords(5).unwrap();
    assert_eq!(base_rim.z, 3.0);
    assert!(holes::find_holes(&ply).unwrap().is_empty());
}
