//! Converts LiDAR height-field rasters to PLY point clouds or meshes.

use std::path::PathBuf;
use std::process;

use lidar_ply::lidar::{import_grid, import_tiles, read_list_from_path, Grid, Offsets, Overlay};
use lidar_ply::{Format, PlyResult, PointCloudBuilder};

struct Options {
    input: Option<PathBuf>,
    image: Option<PathBuf>,
    list: Option<PathBuf>,
    output: Option<PathBuf>,
    offsets: Offsets,
    mesh: bool,
}

fn print_help() {
    println!("Usage:");
    println!("lidar2ply -h : shows this help message");
    println!();
    println!("lidar2ply -f <input file> [options]");
    println!("             <input file> : LiDAR ASCII grid");
    println!("Options: -i <image file> : colour overlay (ImageMagick text or PNG)");
    println!("         -x <value> : add X axis offset to PLY model");
    println!("         -y <value> : add Y axis offset to PLY model");
    println!("         -z <value> : add Z axis offset to PLY model");
    println!();
    println!("lidar2ply -l <list file>");
    println!("             <list file> : text file listing LiDAR/image pairs");
    println!();
    println!("General options: -m : create an output mesh");
    println!("                 -o <file> : output path (default: <input>.ply)");
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options {
        input: None,
        image: None,
        list: None,
        output: None,
        offsets: Offsets::default(),
        mesh: false,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", name))
        };
        match arg.as_str() {
            "-h" => return Ok(None),
            "-f" => options.input = Some(PathBuf::from(value("-f")?)),
            "-i" => options.image = Some(PathBuf::from(value("-i")?)),
            "-l" => options.list = Some(PathBuf::from(value("-l")?)),
            "-o" => options.output = Some(PathBuf::from(value("-o")?)),
            "-x" => options.offsets.x = parse_offset(&value("-x")?)?,
            "-y" => options.offsets.y = parse_offset(&value("-y")?)?,
            "-z" => options.offsets.z = parse_offset(&value("-z")?)?,
            "-m" => options.mesh = true,
            other => return Err(format!("unknown option '{}'", other)),
        }
    }
    if options.input.is_none() && options.list.is_none() {
        return Err("one of -f or -l is required".to_string());
    }
    Ok(Some(options))
}

fn parse_offset(text: &str) -> Result<f64, String> {
    text.parse()
        .map_err(|_| format!("'{}' is not a number", text))
}

fn run(options: Options) -> PlyResult<()> {
    let mut builder = PointCloudBuilder::new();

    if let Some(list) = &options.list {
        let records = read_list_from_path(list)?;
        println!("Processing {} tiles from {}", records.len(), list.display());
        import_tiles(&mut builder, &records, options.offsets.z, options.mesh)?;
    } else if let Some(input) = &options.input {
        println!("Processing LiDAR file: {}", input.display());
        let grid = Grid::read_from_path(input)?;
        let overlay = match &options.image {
            Some(path) => Some(Overlay::read_from_path(path)?),
            None => None,
        };
        import_grid(
            &mut builder,
            &grid,
            overlay.as_ref(),
            options.offsets,
            options.mesh,
        )?;
    }

    let output = options.output.clone().unwrap_or_else(|| {
        let base = options
            .input
            .as_ref()
            .or(options.list.as_ref())
            .expect("parse_args requires an input");
        let mut name = base.as_os_str().to_os_string();
        name.push(".ply");
        PathBuf::from(name)
    });

    let mut ply = builder.into_ply();
    ply.set_format(Format::BinaryLittleEndian);
    println!(
        "Writing {} ({} vertices, {} faces)",
        output.display(),
        ply.vertex_count(),
        ply.face_count()
    );
    ply.write_to_path(output)
}

fn main() {
    pretty_env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args) {
        Ok(None) => print_help(),
        Ok(Some(options)) => {
            if let Err(e) = run(options) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Err(message) => {
            eprintln!("error: {}", message);
            print_help();
            process::exit(2);
        }
    }
}
