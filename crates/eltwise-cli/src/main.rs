use std::process::ExitCode;

use clap::{Parser, Subcommand};
use eltwise_core::{ElementType, Shape, Tensor, ValueRef};
use eltwise_ops::{BroadcastSpec, EVALUATE_TYPES, Executor, Multiply, TYPECHECK_TYPES, TracingScope};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eltwise-cli")]
#[command(about = "Typed elementwise evaluation development CLI")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the reference Multiply scenarios.
    Smoke,
    /// Multiply two iota-filled tensors and print the result.
    Eval {
        /// Shape of input 0, comma separated (empty for a scalar).
        #[arg(long, value_parser = parse_shape, default_value = "")]
        lhs: Shape,
        /// Shape of input 1, comma separated (empty for a scalar).
        #[arg(long, value_parser = parse_shape, default_value = "")]
        rhs: Shape,
        /// Element type of both inputs.
        #[arg(long = "type", value_parser = parse_element_type, default_value = "f32")]
        element_type: ElementType,
        /// Broadcast policy: none, numpy or axis:N.
        #[arg(long, value_parser = parse_spec, default_value = "numpy")]
        broadcast: BroadcastSpec,
    },
    /// List element types and their interpreted-kernel support.
    Types,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let result = match args.cmd {
        Cmd::Smoke => smoke(),
        Cmd::Eval {
            lhs,
            rhs,
            element_type,
            broadcast,
        } => eval(&lhs, &rhs, element_type, broadcast),
        Cmd::Types => {
            types();
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn parse_shape(s: &str) -> Result<Shape, String> {
    if s.trim().is_empty() {
        return Ok(Shape::scalar());
    }
    s.split(',')
        .map(|d| d.trim().parse::<usize>().map_err(|e| format!("bad dimension {d:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()
        .map(Shape::new)
}

fn parse_element_type(s: &str) -> Result<ElementType, String> {
    ElementType::ALL
        .into_iter()
        .find(|et| et.to_string().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown element type {s:?}"))
}

fn parse_spec(s: &str) -> Result<BroadcastSpec, String> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "none" => Ok(BroadcastSpec::None),
        "numpy" => Ok(BroadcastSpec::Numpy),
        _ => s
            .strip_prefix("axis:")
            .and_then(|axis| axis.parse::<i64>().ok())
            .map(BroadcastSpec::ExplicitAxis)
            .ok_or_else(|| format!("unknown broadcast policy {s:?}")),
    }
}

/// Tensor holding 1, 2, 3, ... in `element_type`; zeros for types without
/// an interpreted kernel.
fn iota(shape: &Shape, element_type: ElementType) -> Tensor {
    macro_rules! fill {
        ($ty:ty) => {
            Tensor::from_vec((1..=shape.numel()).map(|v| v as $ty).collect(), shape)
                .unwrap_or_else(|_| Tensor::zeros(element_type, shape))
        };
    }
    match element_type {
        ElementType::F32 => fill!(f32),
        ElementType::F64 => fill!(f64),
        ElementType::I32 => fill!(i32),
        ElementType::I64 => fill!(i64),
        ElementType::U32 => fill!(u32),
        ElementType::U64 => fill!(u64),
        other => Tensor::zeros(other, shape),
    }
}

fn render(t: &Tensor) -> String {
    macro_rules! show {
        ($ty:ty) => {
            t.data::<$ty>()
                .map(|d| format!("{d:?}"))
                .unwrap_or_else(|e| e.to_string())
        };
    }
    match t.element_type() {
        ElementType::F32 => show!(f32),
        ElementType::F64 => show!(f64),
        ElementType::I32 => show!(i32),
        ElementType::I64 => show!(i64),
        ElementType::U32 => show!(u32),
        ElementType::U64 => show!(u64),
        other => format!("<{} elements of {other}>", t.numel()),
    }
}

fn eval(lhs: &Shape, rhs: &Shape, element_type: ElementType, spec: BroadcastSpec) -> CliResult {
    let node = Multiply::new(
        ValueRef::parameter(lhs.clone(), element_type),
        ValueRef::parameter(rhs.clone(), element_type),
        spec,
    )?;
    println!(
        "{} {lhs} x {rhs} ({element_type}, {spec}) -> {}",
        node.name(),
        node.output_meta().shape
    );
    let executor = Executor::new().with_scope(std::sync::Arc::new(TracingScope::default()));
    let (out, path) = executor.run(&node, &[iota(lhs, element_type), iota(rhs, element_type)])?;
    tracing::info!(node = %node.id(), ?path, mode = ?executor.mode(), "evaluated");
    println!("{path:?}: {}", render(&out));
    Ok(())
}

fn smoke() -> CliResult {
    let f32_tensor = |data: &[f32], dims: &[usize]| Tensor::from_vec(data.to_vec(), &Shape::from(dims));
    let run = |label: &str, a: Tensor, b: Tensor| -> CliResult {
        let node = Multiply::new(
            ValueRef::parameter(a.shape().clone(), a.element_type()),
            ValueRef::parameter(b.shape().clone(), b.element_type()),
            BroadcastSpec::Numpy,
        )?;
        let mut outputs = [Tensor::empty(node.output_meta().element_type)];
        let ran = node.evaluate(&mut outputs, &[a, b]);
        println!(
            "{label}: has_evaluate={} ran={ran} shape={} values={}",
            node.has_evaluate(),
            outputs[0].shape(),
            render(&outputs[0])
        );
        Ok(())
    };

    run(
        "[2,3] * [3]",
        f32_tensor(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?,
        f32_tensor(&[10.0, 10.0, 10.0], &[3])?,
    )?;
    run(
        "scalar * [4]",
        Tensor::scalar(5.0f32),
        f32_tensor(&[1.0, 2.0, 3.0, 4.0], &[4])?,
    )?;
    match Multiply::new(
        ValueRef::parameter(vec![2], ElementType::F32),
        ValueRef::parameter(vec![3], ElementType::F32),
        BroadcastSpec::Numpy,
    ) {
        Ok(_) => return Err("[2] * [3] unexpectedly validated".into()),
        Err(e) => println!("[2] * [3]: rejected ({e})"),
    }
    let bools = Tensor::from_vec(vec![true, false], &Shape::new(vec![2]))?;
    run("boolean [2] * [2]", bools.clone(), bools)?;
    run(
        "[0,3] * [3]",
        f32_tensor(&[], &[0, 3])?,
        f32_tensor(&[1.0, 2.0, 3.0], &[3])?,
    )?;

    tracing::info!("smoke scenarios complete");
    println!("\nAll smoke scenarios ran.");
    Ok(())
}

fn class_of(et: ElementType) -> &'static str {
    if et.is_real() {
        "float"
    } else if et.is_integral() && et.is_signed() {
        "signed"
    } else if et.is_integral() {
        "unsigned"
    } else {
        "boolean"
    }
}

fn types() {
    for class in ["float", "signed", "unsigned", "boolean"] {
        println!("{class}:");
        for &et in TYPECHECK_TYPES.iter().filter(|&&et| class_of(et) == class) {
            let path = if EVALUATE_TYPES.contains(&et) {
                "interpreted"
            } else {
                "compiled only"
            };
            println!("  {et:<8} {:>2} bytes  {path}", et.size_bytes());
        }
    }
}
