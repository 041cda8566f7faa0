use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fabric-prog",
    about = "FPGA bitstream programmer for PicoFabric boards over USB serial"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Warnings and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Upload a bitstream file to the FPGA
    Program(ProgramOpts),
    /// Query the device and report its identity and FPGA state
    Info(ConnectOpts),
    /// Scan serial ports for programmer devices
    List,
    /// Erase the stored bitstream and disable program-on-startup
    ClearFlash(ConnectOpts),
    /// Report the bitstream stored in the programmer's flash
    QueryFlash(ConnectOpts),
    /// Reboot the programmer device
    Reboot(ConnectOpts),
}

#[derive(Args, Debug, Clone)]
pub struct ConnectOpts {
    /// Serial port to use instead of auto detection (e.g. /dev/ttyACM0 or COM6)
    #[arg(short, long)]
    pub port: Option<String>,
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ProgramOpts {
    #[command(flatten)]
    pub connect: ConnectOpts,
    /// Bitstream file (.bit), treated as an opaque blob
    pub bitstream: PathBuf,
    /// Also save the bitstream to the programmer's flash
    #[arg(short, long)]
    pub save: bool,
}
