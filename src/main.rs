use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};

use oscremote::avatar::{Avatar, ParamView};
use oscremote::config::Config;
use oscremote::osc::{OscSender, OscService, OscValue};
use oscremote::translate::{IdentityTranslator, Translator};

fn main() -> io::Result<()> {
    env_logger::init();

    let config = Config::load();
    let descriptor = match descriptor_path(&config) {
        Some(path) => path,
        None => {
            eprintln!("usage: oscremote <avatar-descriptor.json>");
            eprintln!("(or set avatar.descriptor_dir in the config file)");
            std::process::exit(2);
        }
    };

    let mut service = OscService::new();
    let (recv_addr, recv_port) = config.receive_endpoint();
    let (send_addr, send_port) = config.send_endpoint();
    service.configure(&recv_addr, recv_port, &send_addr, send_port)?;
    log::info!(
        "listening on {}:{}, sending to {}:{}",
        recv_addr,
        recv_port,
        send_addr,
        send_port
    );
    let service = Rc::new(service);

    let mut avatar = Avatar::new(Rc::clone(&service) as Rc<dyn OscSender>);
    avatar.load_file(&descriptor)?;
    log::info!(
        "loaded avatar {} ({}), {} parameters",
        avatar.name,
        avatar.id,
        avatar.len()
    );
    let avatar = Rc::new(avatar);

    let routed = Rc::clone(&avatar);
    service.set_handler(Box::new(move |msg| routed.route_incoming(&msg)));

    let mut view = ParamView::standard(&config.excluded_prefixes());
    view.recompute(&avatar);

    run(&service, &avatar, &mut view)
}

fn run(service: &OscService, avatar: &Avatar, view: &mut ParamView) -> io::Result<()> {
    let stdin_rx = spawn_stdin_reader();
    let translator = IdentityTranslator;

    println!(
        "{}: {} parameters shown. Commands: list, set, select, toggle, filters, translate, quit.",
        avatar.name,
        view.items().len()
    );

    loop {
        service.process_incoming();

        for (name, value) in view.take_changes() {
            println!("{} = {}", name, value);
        }

        match stdin_rx.recv_timeout(Duration::from_millis(16)) {
            Ok(line) => {
                if !handle_command(line.trim(), avatar, view, &translator) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break, // stdin closed
        }
    }
    Ok(())
}

/// Returns false when the loop should exit.
fn handle_command(
    line: &str,
    avatar: &Avatar,
    view: &mut ParamView,
    translator: &dyn Translator,
) -> bool {
    let mut parts = line.splitn(3, ' ');
    match parts.next().unwrap_or("") {
        "" => {}
        "quit" | "exit" => return false,
        "list" => print_view(view),
        "filters" => {
            for filter in view.filters() {
                let mark = if filter.is_active() { 'x' } else { ' ' };
                println!("[{}] {}", mark, filter.label());
            }
        }
        "set" => match (parts.next(), parts.next().and_then(parse_value)) {
            (Some(name), Some(value)) => match avatar.param(name) {
                Some(param) => param.borrow_mut().set_value(value),
                None => println!("no parameter named {}", name),
            },
            _ => println!("usage: set <name> <true|false|int|float>"),
        },
        "select" => match parts.next().and_then(|name| avatar.param(name)) {
            Some(param) => {
                let mut p = param.borrow_mut();
                p.selected = !p.selected;
                drop(p);
                view.recompute(avatar);
            }
            None => println!("usage: select <name>"),
        },
        "toggle" => {
            let label = line.strip_prefix("toggle ").unwrap_or("");
            if !view.toggle(label, avatar) {
                println!("no filter labeled {:?}", label);
            }
        }
        "translate" => match parts.next().and_then(|name| avatar.param(name)) {
            Some(param) => {
                let name = param.borrow().name.clone();
                let target = Rc::clone(&param);
                translator.translate(
                    &name,
                    Box::new(move |result| target.borrow_mut().set_translation(&result)),
                );
            }
            None => println!("usage: translate <name>"),
        },
        other => println!("unknown command {:?}", other),
    }
    true
}

fn print_view(view: &ParamView) {
    for param in view.items() {
        let p = param.borrow();
        let mark = if p.selected { '*' } else { ' ' };
        match &p.translation {
            Some(t) => println!(
                "{} {} {} = {} ({})",
                mark,
                p.osc_type.display_char(),
                p.name,
                p.value(),
                t
            ),
            None => println!(
                "{} {} {} = {}",
                mark,
                p.osc_type.display_char(),
                p.name,
                p.value()
            ),
        }
    }
}

/// First positional argument, else the newest descriptor in the configured
/// directory.
fn descriptor_path(config: &Config) -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }
    newest_descriptor(&config.descriptor_dir()?)
}

fn newest_descriptor(dir: &Path) -> Option<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    newest.map(|(_, path)| path)
}

fn parse_value(text: &str) -> Option<OscValue> {
    match text {
        "true" => Some(OscValue::Bool(true)),
        "false" => Some(OscValue::Bool(false)),
        _ => text
            .parse::<i32>()
            .map(OscValue::Int)
            .ok()
            .or_else(|| text.parse::<f32>().map(OscValue::Float).ok()),
    }
}

/// Stdin is blocking, so a helper thread feeds lines into a channel the
/// main loop polls alongside the network.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}
