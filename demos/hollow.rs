use dexhollow::hollow::{hollow_file, HollowRequest};
use dexhollow::query::MethodQuery;
use std::env;
use std::error::Error;
use std::path::PathBuf;

// Hollows one method out of a dex file, e.g.
//   hollow classes.dex 'Lcom/example/Check;->isRooted:Z' out.dex isRooted.code

//Usage: hollow <dex-file> <method-query> <out-dex> <out-code>
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        println!("Usage: {} <dex-file> <Lpkg/Cls;->name:SHORTY> <out-dex> <out-code>", args[0]);
        return;
    }

    // Do everything else with the error trap
    match process_dex(&args[1], &args[2], &args[3], &args[4]) {
        Ok(_) => {
            println!("All done: written {} and {}", args[3], args[4]);
        }
        Err(e) => {
            println!("Aborted due to error: {}", e);
        }
    }
}

fn process_dex(dex_file: &str, query: &str, out_dex: &str, out_code: &str) -> Result<(), Box<dyn Error>> {
    let request = HollowRequest {
        input: PathBuf::from(dex_file),
        output: PathBuf::from(out_dex),
        aux_output: PathBuf::from(out_code),
        query: query.parse::<MethodQuery>()?,
    };

    let hollowed = match hollow_file(&request) {
        Ok(h) => h,
        Err(e) if e.is_lookup_failure() => {
            println!("Nothing to hollow: {}", e);
            return Ok(());
        }
        Err(e) => return Err(Box::new(e)),
    };
    println!(
        "{} (method {}): {} code units extracted",
        hollowed.descriptor,
        hollowed.method_idx,
        hollowed.original.insns.len()
    );
    Ok(())
}
