//! # Quire CLI
//!
//! Usage:
//!   quire input.json                 summary of pages and warnings
//!   quire input.json --boxes         every positioned box
//!   echo '{ ... }' | quire -o layout.json
//!   quire --example > report.json
//!
//! Set `RUST_LOG=quire=debug` to trace table splits and page breaks.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use quire::layout::{LayoutBox, LayoutOutput};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quire=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return ExitCode::SUCCESS;
    }

    // Read input
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).map_err(|e| format!("failed to read {}: {e}", args[1]))
    } else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map(|_| buf)
            .map_err(|e| format!("failed to read stdin: {e}"))
    };
    let input = match input {
        Ok(input) => input,
        Err(message) => {
            eprintln!("✗ {message}");
            return ExitCode::FAILURE;
        }
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());
    let with_boxes = args.iter().any(|a| a == "--boxes");

    let output = match quire::layout_json(&input) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = if with_boxes {
        serde_json::to_value(&output).unwrap_or(Value::Null)
    } else {
        summary(&output)
    };
    let text = match serde_json::to_string_pretty(&report) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("✗ failed to serialize layout: {e}");
            return ExitCode::FAILURE;
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &text) {
                eprintln!("✗ failed to write {path}: {e}");
                return ExitCode::FAILURE;
            }
            eprintln!(
                "✓ {} pages, {} warnings written to {}",
                output.pages.len(),
                output.warnings.len(),
                path
            );
        }
        None => println!("{text}"),
    }
    ExitCode::SUCCESS
}

fn summary(output: &LayoutOutput) -> Value {
    let pages: Vec<Value> = output
        .pages
        .iter()
        .map(|page| {
            let boxes = page.all_boxes();
            json!({
                "number": page.number,
                "width": page.width,
                "height": page.height,
                "boxes": boxes.len(),
                "clipped": boxes.iter().filter(|b| b.clipped).count(),
                "top": page.boxes.iter().map(describe).collect::<Vec<_>>(),
            })
        })
        .collect();
    let warnings: Vec<String> = output.warnings.iter().map(|w| w.to_string()).collect();
    json!({ "pages": pages, "warnings": warnings })
}

fn describe(b: &LayoutBox) -> Value {
    json!({
        "kind": b.kind,
        "id": b.id,
        "y": b.y,
        "height": b.height,
    })
}

fn example_report_json() -> &'static str {
    r##"{
  "page": {
    "size": "A5",
    "margin": { "top": 36, "right": 36, "bottom": 36, "left": 36 }
  },
  "children": [
    {
      "kind": { "type": "Paragraph", "text": "Quarterly shipments" },
      "properties": { "fontSize": { "length": 18 }, "marginBottom": { "length": 8 } }
    },
    {
      "kind": { "type": "Div" },
      "id": "note",
      "properties": {
        "float": { "float": "Right" },
        "width": { "dimension": { "Pt": 120 } },
        "paddingTop": { "length": 4 },
        "paddingBottom": { "length": 4 },
        "border": { "border": { "width": 0.5 } }
      },
      "children": [
        { "kind": { "type": "Paragraph", "text": "Figures are in units shipped." } }
      ]
    },
    {
      "kind": { "type": "Paragraph", "text": "Rows repeat their header on every page. The region cell spans the rows of its region and is cut where the table splits." }
    },
    {
      "kind": {
        "type": "Table",
        "columns": [{ "Pt": 90 }, "Auto", { "Pt": 60 }],
        "header": [
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Region" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Product" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Units" } }] } }
        ],
        "body": [
          { "cell": { "kind": { "type": "Cell", "rowspan": 3 }, "children": [{ "kind": { "type": "Paragraph", "text": "North" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Anchors" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "1200" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Buoys" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "340" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Rope, braided" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "5800" } }] } },
          { "cell": { "kind": { "type": "Cell", "rowspan": 2 }, "children": [{ "kind": { "type": "Paragraph", "text": "South" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Anchors" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "870" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "Chain" } }] } },
          { "cell": { "kind": { "type": "Cell" }, "children": [{ "kind": { "type": "Paragraph", "text": "95" } }] } }
        ],
        "footer": [
          { "cell": { "kind": { "type": "Cell", "colspan": 3 }, "children": [{ "kind": { "type": "Paragraph", "text": "Continued on the next page" } }] } }
        ],
        "skipLastFooter": true
      },
      "id": "shipments"
    }
  ]
}
"##
}
