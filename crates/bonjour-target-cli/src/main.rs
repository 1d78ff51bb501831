use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

use bonjour_target::abi::{ELIMINABLE_REGS, FIRST_PSEUDO_REGISTER};
use bonjour_target::target::TARGET_NAMES;
use bonjour_target::{
    ArgLocation, FunctionInfo, FunctionType, MachineMode, RegNo, Rtx, TargetConfig, TargetHooks,
    Type,
};

#[derive(Parser)]
#[command(name = "bonjour-target")]
#[command(about = "Query the bonjour target description")]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "bonjour",
        value_parser = clap::builder::PossibleValuesParser::new(TARGET_NAMES),
        help = "Target architecture"
    )]
    target: String,

    #[arg(long, global = true, help = "Target configuration file (key = value lines)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Number of argument registers (0-4)")]
    arg_regs: Option<u8>,

    #[arg(long, global = true, help = "Generate position-independent code")]
    pic: bool,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the hard registers with their classes and accepted modes.
    Registers,

    /// Show where the arguments of a call are passed.
    Args {
        #[arg(
            value_parser = parse_type,
            help = "Argument types: i8, i16, i32, i64, f32, f64, ptr, void, struct:SIZE[:ALIGN]"
        )]
        types: Vec<Type>,

        #[arg(long, help = "Arguments from this index on are matched by '...'")]
        variadic_from: Option<usize>,

        #[arg(long, help = "The call is to a support library routine")]
        libcall: bool,
    },

    /// Compute a frame layout and its elimination offsets.
    Frame {
        #[arg(long, value_delimiter = ',', help = "Registers the function body uses")]
        saved_regs: Vec<RegNo>,

        #[arg(long, default_value_t = 0, help = "Bytes of local variables")]
        locals: u32,

        #[arg(long, default_value_t = 0, help = "Bytes of outgoing stack arguments")]
        outgoing: u32,

        #[arg(long, help = "The function makes no calls")]
        leaf: bool,

        #[arg(long, help = "The function is an interrupt handler")]
        interrupt: bool,

        #[arg(long, help = "The function needs a hard frame pointer")]
        frame_pointer: bool,
    },

    /// Check whether an address expression is legitimate.
    Address {
        #[arg(long, default_value = "SI", help = "Mode of the memory access")]
        mode: MachineMode,

        #[arg(long, help = "Check as after register allocation")]
        strict: bool,

        #[arg(help = "Address, e.g. 'sp+8', 'r1+r2', '@sym', 'post_inc r4', '1024'")]
        expr: Rtx,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.arg_regs, cli.pic)?;
    let target = bonjour_target::target_by_name(&cli.target, config)
        .with_context(|| format!("Failed to set up target '{}'", cli.target))?;

    let report = match cli.command {
        Commands::Registers => registers(target.as_ref()),
        Commands::Args {
            types,
            variadic_from,
            libcall,
        } => args(target.as_ref(), types, variadic_from, libcall)?,
        Commands::Frame {
            saved_regs,
            locals,
            outgoing,
            leaf,
            interrupt,
            frame_pointer,
        } => {
            let info = FunctionInfo {
                is_interrupt: interrupt,
                is_leaf: leaf,
                frame_pointer_needed: frame_pointer,
                ..FunctionInfo::default()
            }
            .with_used_regs(saved_regs)
            .with_locals(locals)
            .with_outgoing_args(outgoing);
            frame(target.as_ref(), &info)
        }
        Commands::Address { mode, strict, expr } => address(target.as_ref(), mode, &expr, strict),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.json)?);
    } else {
        for line in &report.lines {
            println!("{line}");
        }
    }

    Ok(())
}

/// Output of one query, in both renderings.
struct Report {
    lines: Vec<String>,
    json: Value,
}

fn load_config(path: Option<&Path>, arg_regs: Option<u8>, pic: bool) -> Result<TargetConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            contents
                .parse::<TargetConfig>()
                .with_context(|| format!("Invalid target configuration in {}", path.display()))?
        }
        None => TargetConfig::default(),
    };
    if let Some(count) = arg_regs {
        config = config.with_arg_regs(count);
    }
    if pic {
        config = config.with_pic(true);
    }
    Ok(config)
}

fn registers(target: &dyn TargetHooks) -> Report {
    let mut lines = vec![format!("{:<4} {:<5} {:<13} {:<4} modes", "reg", "name", "class", "arg")];
    let mut entries = Vec::new();

    for regno in (0..FIRST_PSEUDO_REGISTER).map(RegNo) {
        let class = target.reg_class_of(regno);
        let is_arg = target.is_arg_register(regno);
        let modes: Vec<&str> = MachineMode::ALL
            .into_iter()
            .filter(|&mode| target.reg_mode_ok(regno, mode))
            .map(MachineMode::name)
            .collect();

        let name = regno.to_string();
        lines.push(format!(
            "r{:<3} {name:<5} {:<13} {:<4} {}",
            regno.0,
            class.name(),
            if is_arg { "yes" } else { "" },
            modes.join(" ")
        ));
        entries.push(json!({
            "regno": regno.0,
            "name": name,
            "class": class.name(),
            "arg": is_arg,
            "modes": modes,
        }));
    }

    Report {
        lines,
        json: json!({ "target": target.name(), "registers": entries }),
    }
}

fn args(
    target: &dyn TargetHooks,
    mut types: Vec<Type>,
    variadic_from: Option<usize>,
    libcall: bool,
) -> Result<Report> {
    let (fntype, extra) = match variadic_from {
        Some(named) => {
            anyhow::ensure!(
                named <= types.len(),
                "--variadic-from {named} exceeds the {} arguments given",
                types.len()
            );
            let extra = types.split_off(named);
            (FunctionType::new(types, Type::Void).variadic(), extra)
        }
        None => (FunctionType::new(types, Type::Void), Vec::new()),
    };

    let layout = target.assign_arguments(&fntype, &extra, libcall);
    let all_types = fntype.params.iter().chain(&extra);

    let mut lines = Vec::new();
    let mut entries = Vec::new();
    for (i, (ty, location)) in all_types.zip(&layout.args).enumerate() {
        lines.push(format!("arg {i}: {:<5} {}", ty.mode().name(), describe_location(location)));
        entries.push(json!({
            "index": i,
            "mode": ty.mode().name(),
            "location": location_json(location),
        }));
    }
    lines.push(format!(
        "{} argument register(s), {} stack byte(s)",
        layout.regs_used, layout.stack_bytes
    ));

    Ok(Report {
        lines,
        json: json!({
            "args": entries,
            "regs_used": layout.regs_used,
            "stack_bytes": layout.stack_bytes,
        }),
    })
}

fn describe_location(location: &ArgLocation) -> String {
    match *location {
        ArgLocation::Register {
            mode, by_reference, ..
        } => {
            let regs: Vec<String> = location.registers().iter().map(ToString::to_string).collect();
            let suffix = if by_reference { ", by reference" } else { "" };
            format!("{} ({mode}{suffix})", regs.join(":"))
        }
        ArgLocation::Stack {
            offset,
            size,
            by_reference,
        } => {
            let suffix = if by_reference { ", by reference" } else { "" };
            format!("sp+{offset} ({size} bytes{suffix})")
        }
        ArgLocation::Empty => "none".to_string(),
    }
}

fn location_json(location: &ArgLocation) -> Value {
    match *location {
        ArgLocation::Register {
            reg,
            mode,
            by_reference,
        } => json!({
            "kind": "register",
            "reg": reg.to_string(),
            "mode": mode.name(),
            "by_reference": by_reference,
        }),
        ArgLocation::Stack {
            offset,
            size,
            by_reference,
        } => json!({
            "kind": "stack",
            "offset": offset,
            "size": size,
            "by_reference": by_reference,
        }),
        ArgLocation::Empty => json!({ "kind": "empty" }),
    }
}

fn frame(target: &dyn TargetHooks, info: &FunctionInfo) -> Report {
    let layout = target.frame_layout(info);
    let saved: Vec<String> = layout.saved_regs.iter().map(ToString::to_string).collect();

    let mut lines = vec![
        format!("saved registers: {}", saved.join(" ")),
        format!("save area:       {} bytes", layout.saved_size),
        format!("locals:          {} bytes", layout.locals_size),
        format!("outgoing args:   {} bytes", layout.outgoing_args_size),
        format!("total:           {} bytes", layout.total_size()),
    ];
    let mut eliminations = Vec::new();

    for (from, to) in ELIMINABLE_REGS {
        let allowed = target.can_eliminate(from, to, info.frame_pointer_needed);
        let offset = target.elimination_offset(&layout, from, to).ok();
        lines.push(match (offset, allowed) {
            (Some(offset), true) => format!("{from} -> {to}: {offset}"),
            (Some(offset), false) => format!("{from} -> {to}: {offset} (not allowed)"),
            (None, _) => format!("{from} -> {to}: unsupported"),
        });
        eliminations.push(json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "offset": offset,
            "allowed": allowed,
        }));
    }

    Report {
        lines,
        json: json!({
            "saved_regs": saved,
            "saved_size": layout.saved_size,
            "locals_size": layout.locals_size,
            "outgoing_args_size": layout.outgoing_args_size,
            "total_size": layout.total_size(),
            "eliminations": eliminations,
        }),
    }
}

fn address(target: &dyn TargetHooks, mode: MachineMode, expr: &Rtx, strict: bool) -> Report {
    let legitimate = target.is_legitimate_address(mode, expr, strict);
    let pic_operand = target.is_legitimate_pic_operand(expr);
    let checking = if strict { "strict" } else { "non-strict" };

    Report {
        lines: vec![
            format!(
                "{expr}: {} {mode} address ({checking})",
                if legitimate { "legitimate" } else { "not a legitimate" }
            ),
            format!(
                "{expr}: {} PIC operand",
                if pic_operand { "legitimate" } else { "not a legitimate" }
            ),
        ],
        json: json!({
            "expr": expr.to_string(),
            "mode": mode.name(),
            "strict": strict,
            "legitimate": legitimate,
            "pic_operand": pic_operand,
        }),
    }
}

/// Parse a type name as written on the command line.
///
/// ```text
/// i8 i16 i32 i64 f32 f64 ptr void
/// struct:12      # 12 bytes, word aligned
/// struct:16:8    # 16 bytes, 8-byte aligned
/// ```
fn parse_type(s: &str) -> Result<Type, String> {
    let ty = match s {
        "void" => Type::Void,
        "i8" => Type::I8,
        "i16" => Type::I16,
        "i32" => Type::I32,
        "i64" => Type::I64,
        "f32" => Type::F32,
        "f64" => Type::F64,
        "ptr" => Type::Pointer,
        _ => {
            let rest = s
                .strip_prefix("struct:")
                .ok_or_else(|| format!("unknown type '{s}'"))?;
            let (size, align) = rest.split_once(':').unwrap_or((rest, "4"));
            let size = size
                .trim()
                .parse()
                .map_err(|_| format!("invalid struct size '{size}'"))?;
            let align: u32 = align
                .trim()
                .parse()
                .map_err(|_| format!("invalid struct alignment '{align}'"))?;
            if !align.is_power_of_two() {
                return Err(format!("struct alignment {align} is not a power of two"));
            }
            Type::Aggregate { size, align }
        }
    };
    Ok(ty)
}
