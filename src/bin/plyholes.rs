//! Inspects and edits PLY files: header/bounds report, format conversion,
//! scaling, recolouring, hole detection and hole filling.

use std::path::PathBuf;
use std::process;

use lidar_ply::holes;
use lidar_ply::{Format, Ply, PlyResult};

enum Fill {
    Fan,
    Base(f64),
}

struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    info: bool,
    report_holes: bool,
    fill: Option<Fill>,
    format: Option<Format>,
    scale: Option<(f64, f64, f64)>,
    colour: Option<(u8, u8, u8)>,
}

fn print_help() {
    println!("Usage: plyholes <input.ply> [options]");
    println!();
    println!("Options: --info : print header, counts and bounding box");
    println!("         --holes : report boundary loops");
    println!("         --fill fan : close every hole with a triangle fan");
    println!("         --fill base:<pct> : close every hole with an extruded base,");
    println!("                             extruded by <pct> percent of the model height");
    println!("         --format <fmt> : convert to ascii, binary_big_endian or");
    println!("                          binary_little_endian");
    println!("         --scale <sx,sy,sz> : scale the model");
    println!("         --colour <r,g,b> : set every vertex colour");
    println!("         -o <file> : output path (default: overwrite input)");
    println!();
    println!("Note: filled faces are not re-oriented; run the result through a");
    println!("mesh tool if consistent normals are needed.");
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut input = None;
    let mut options = Options {
        input: PathBuf::new(),
        output: None,
        info: false,
        report_holes: false,
        fill: None,
        format: None,
        scale: None,
        colour: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", name))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--info" => options.info = true,
            "--holes" => options.report_holes = true,
            "--fill" => {
                let text = value("--fill")?;
                options.fill = Some(match text.split_once(':') {
                    None if text == "fan" => Fill::Fan,
                    Some(("base", pct)) => Fill::Base(
                        pct.parse()
                            .map_err(|_| format!("'{}' is not a percentage", pct))?,
                    ),
                    _ => return Err(format!("unknown fill mode '{}'", text)),
                });
            }
            "--format" => {
                options.format =
                    Some(value("--format")?.parse().map_err(|e| format!("{}", e))?)
            }
            "--scale" => {
                let text = value("--scale")?;
                let parts: Vec<f64> = text
                    .split(',')
                    .map(|t| t.parse().map_err(|_| format!("bad scale '{}'", text)))
                    .collect::<Result<_, _>>()?;
                match parts.as_slice() {
                    [sx, sy, sz] => options.scale = Some((*sx, *sy, *sz)),
                    _ => return Err("scale needs three comma-separated factors".to_string()),
                }
            }
            "--colour" => {
                let text = value("--colour")?;
                let parts: Vec<u8> = text
                    .split(',')
                    .map(|t| t.parse().map_err(|_| format!("bad colour '{}'", text)))
                    .collect::<Result<_, _>>()?;
                match parts.as_slice() {
                    [r, g, b] => options.colour = Some((*r, *g, *b)),
                    _ => return Err("colour needs three comma-separated values".to_string()),
                }
            }
            "-o" => options.output = Some(PathBuf::from(value("-o")?)),
            other if input.is_none() && !other.starts_with('-') => {
                input = Some(PathBuf::from(other));
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
    }
    match input {
        Some(path) => {
            options.input = path;
            Ok(Some(options))
        }
        None => Err("an input file is required".to_string()),
    }
}

fn run(options: Options) -> PlyResult<()> {
    let mut ply = Ply::read_from_path(&options.input)?;
    let mut modified = false;

    if options.info {
        print!("{}", ply.print_header());
        println!("vertices: {}", ply.vertex_count());
        println!("faces: {}", ply.face_count());
        if ply.vertex_count() > 0 {
            let b = ply.bounding_box()?;
            println!(
                "bounding box: x [{}, {}] y [{}, {}] z [{}, {}]",
                b.min.x, b.max.x, b.min.y, b.max.y, b.min.z, b.max.z
            );
        }
    }

    if options.report_holes || options.fill.is_some() {
        let loops = holes::find_holes(&ply)?;
        println!("{} hole(s) found", loops.len());
        for (i, hole) in loops.iter().enumerate() {
            println!("  hole {}: {} vertices", i, hole.len());
        }
        if let Some(fill) = &options.fill {
            for hole in &loops {
                match fill {
                    Fill::Fan => {
                        holes::fan_fill(&mut ply, hole)?;
                    }
                    Fill::Base(pct) => holes::base_fill(&mut ply, hole, *pct)?,
                }
            }
            modified = !loops.is_empty();
        }
    }

    if let Some((sx, sy, sz)) = options.scale {
        ply.scale(sx, sy, sz)?;
        modified = true;
    }
    if let Some((r, g, b)) = options.colour {
        ply.set_all_vertex_colors(r, g, b)?;
        modified = true;
    }
    if let Some(format) = options.format {
        ply.set_format(format);
        modified = true;
    }

    if modified || options.output.is_some() {
        let output = options.output.unwrap_or(options.input);
        println!(
            "Writing {} ({} vertices, {} faces)",
            output.display(),
            ply.vertex_count(),
            ply.face_count()
        );
        ply.write_to_path(output)?;
    }
    Ok(())
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
