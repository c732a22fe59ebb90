//! The `ext2shell` REPL: tokenizes one line at a time and dispatches to the command handlers in
//! [`ext2shell::commands`]. Prompt formatting, argument parsing, and result printing all live
//! here; nothing below this layer touches stdout/stderr.

use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ext2shell::commands;
use ext2shell::ext2::session::Session;
use ext2shell::ext2::volume::Volume;
use ext2shell::ext2::Error;
use ext2shell::ext2::Result;

/// An interactive read/write shell over a raw ext2 filesystem image.
#[derive(Parser)]
#[command(name = "ext2shell")]
struct Cli {
	/// Path to the ext2 image to open read/write.
	image: PathBuf,

	/// Raise the log level (equivalent to RUST_LOG=debug).
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let mut builder = env_logger::Builder::from_default_env();
	if cli.verbose {
		builder.filter_level(log::LevelFilter::Debug);
	}
	builder.init();

	let mut vol = match Volume::open(&cli.image) {
		Ok(vol) => vol,
		Err(e) => {
			eprintln!("ext2shell: {}: {e}", cli.image.display());
			return ExitCode::FAILURE;
		}
	};

	let image_name = cli.image.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| cli.image.display().to_string());

	let mut session = Session::new();
	let stdin = io::stdin();
	loop {
		print!("ext2shell:[{image_name}:{}] $ ", session.cwd_path());
		let _ = io::stdout().flush();

		let mut line = String::new();
		let bytes_read = match stdin.lock().read_line(&mut line) {
			Ok(n) => n,
			Err(e) => {
				eprintln!("ext2shell: {e}");
				return ExitCode::FAILURE;
			}
		};
		if bytes_read == 0 {
			println!();
			break;
		}

		let tokens: Vec<&str> = line.split_whitespace().collect();
		let Some(&cmd) = tokens.first() else {
			continue;
		};
		if cmd == "quit" || cmd == "exit" {
			break;
		}

		if let Err(e) = dispatch(&mut vol, &mut session, cmd, &tokens[1..]) {
			eprintln!("ext2shell: {cmd}: {e}");
		}
	}

	ExitCode::SUCCESS
}

/// Runs one parsed command line against the open volume, printing its result.
fn dispatch(vol: &mut Volume, session: &mut Session, cmd: &str, args: &[&str]) -> Result<()> {
	match cmd {
		"info" => print_info(&commands::info::info(vol)),
		"ls" => print_listing(&commands::ls::ls(vol, session.cwd_inode(), args.first().copied())?),
		"cat" => {
			let data = commands::cat::cat(vol, session.cwd_inode(), arg(args, 0, "cat")?)?;
			let _ = io::stdout().write_all(&data);
		}
		"attr" => print_attr(&commands::attr::attr(vol, session.cwd_inode(), arg(args, 0, "attr")?)?),
		"pwd" => println!("{}", commands::cd::pwd(session)),
		"cd" => commands::cd::cd(vol, session, args.first().copied())?,
		"touch" => commands::touch::touch(vol, session.cwd_inode(), arg(args, 0, "touch")?)?,
		"mkdir" => commands::mkdir::mkdir(vol, session.cwd_inode(), arg(args, 0, "mkdir")?)?,
		"rm" => commands::rm::rm(vol, session.cwd_inode(), arg(args, 0, "rm")?)?,
		"rmdir" => commands::rmdir::rmdir(vol, session.cwd_inode(), arg(args, 0, "rmdir")?)?,
		"rename" => commands::rename::rename(vol, session.cwd_inode(), arg(args, 0, "rename")?, arg(args, 1, "rename")?)?,
		"mv" => commands::mv::mv(vol, session.cwd_inode(), arg(args, 0, "mv")?, arg(args, 1, "mv")?)?,
		"cp" => commands::cp::cp(vol, session.cwd_inode(), arg(args, 0, "cp")?, arg(args, 1, "cp")?)?,
		_ => eprintln!("ext2shell: {cmd}: unknown command"),
	}
	Ok(())
}

/// Picks out the `i`-th positional argument of a typed command, rather than panicking on an
/// out-of-bounds index when the user omits one.
fn arg<'a>(args: &[&'a str], i: usize, cmd: &str) -> Result<&'a str> {
	args.get(i).copied().ok_or_else(|| Error::InvalidName(format!("{cmd}: missing argument")))
}

fn print_info(i: &commands::info::Info) {
	println!("magic:              0x{:04x}", i.magic);
	println!("block size:         {}", i.block_size);
	println!("inode size:         {}", i.inode_size);
	println!("inodes:             {} total, {} free", i.total_inodes, i.free_inodes);
	println!("blocks:             {} total, {} free", i.total_blocks, i.free_blocks);
	println!("blocks per group:   {}", i.blocks_per_group);
	println!("inodes per group:   {}", i.inodes_per_group);
	println!("first data block:   {}", i.first_data_block);
	println!("group count:        {}", i.group_count);
	println!("revision level:     {}", i.rev_level);
	println!("volume name:        {}", i.volume_name);
}

fn print_listing(listing: &commands::ls::Listing) {
	match listing {
		commands::ls::Listing::File(name) => println!("{name}"),
		commands::ls::Listing::Dir(entries) => {
			for e in entries {
				println!("{}{}", e.name, e.file_type.ls_suffix());
			}
		}
	}
}

fn print_attr(a: &commands::attr::Attr) {
	println!("type:         {:?}", a.file_type);
	println!("permissions:  {:04o}", a.permissions);
	println!("uid/gid:      {}/{}", a.uid, a.gid);
	println!("size:         {}", a.size);
	println!("links:        {}", a.links_count);
	println!("blocks:       {}", a.blocks);
	println!("atime:        {}", a.atime);
	println!("ctime:        {}", a.ctime);
	println!("mtime:        {}", a.mtime);
	println!("dtime:        {}", a.dtime);
	println!("flags:        0x{:08x}", a.flags);
	println!("block[0..15]: {:?}", a.block);
}
