use remark::DataPath;
use remark_chrome::{run, setup_logging, Args, RemarkOptions};
use tracing::{error, warn};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (args, unrecognized) = Args::parse(args.get(1..).unwrap_or_default());

    let path = args
        .datapath
        .as_ref()
        .map(DataPath::new)
        .unwrap_or_default();

    let _guard = setup_logging(&path, args.options.contains(RemarkOptions::Debug));

    for arg in &unrecognized {
        warn!("unrecognized argument '{arg}'");
    }

    match run(&args, &path) {
        Ok(rendered) => print!("{rendered}"),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
