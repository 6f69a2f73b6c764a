//! Line-oriented command shell.

use std::sync::Arc;

use musicschool_client::commands::{auth, groups, performances, profile, study};
use musicschool_client::AppState;
use musicschool_shared::models::{format_date, Message};
use musicschool_shared::progress::format_time;
use musicschool_shared::validation::ProfileForm;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "\
Commands:
  signup <email> <password>      create an account
  login <email> <password>       sign in
  logout                         sign out
  whoami                         show the signed-in account
  profile                        show your profile
  profile-set                    edit your profile
  start | stop                   start or stop a practice session
  status [--watch]               show the running session
  today                          today's total and achievement
  history [days]                 recent daily totals
  groups                         list study groups
  join <group>                   join a group and open it
  open <group>                   open a group you belong to
  post <text>                    send a message to the open group
  messages                       reload the open group
  perform <link> <title>         publish a performance
  performances                   list performances
  help | quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    SignUp { email: String, password: String },
    Login { email: String, password: String },
    Logout,
    WhoAmI,
    Profile,
    ProfileSet,
    Start,
    Stop,
    Status { watch: bool },
    Today,
    History { days: Option<u32> },
    Groups,
    Join(String),
    Open(String),
    Post(String),
    Messages,
    Perform { link: String, title: String },
    Performances,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let two = |usage: &str| -> Result<(String, String), String> {
        match args.as_slice() {
            [a, b] => Ok((a.to_string(), b.to_string())),
            _ => Err(format!("usage: {usage}")),
        }
    };
    let one = |usage: &str| -> Result<String, String> {
        match args.as_slice() {
            [a] => Ok(a.to_string()),
            _ => Err(format!("usage: {usage}")),
        }
    };

    let command = match word {
        "" => return Ok(None),
        "signup" => {
            let (email, password) = two("signup <email> <password>")?;
            Command::SignUp { email, password }
        }
        "login" => {
            let (email, password) = two("login <email> <password>")?;
            Command::Login { email, password }
        }
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "profile" => Command::Profile,
        "profile-set" => Command::ProfileSet,
        "start" => Command::Start,
        "stop" => Command::Stop,
        "status" => Command::Status {
            watch: args.contains(&"--watch"),
        },
        "today" => Command::Today,
        "history" => Command::History {
            days: match args.first() {
                Some(d) => Some(d.parse().map_err(|_| format!("not a number of days: {d}"))?),
                None => None,
            },
        },
        "groups" => Command::Groups,
        "join" => Command::Join(one("join <group>")?),
        "open" => Command::Open(one("open <group>")?),
        "post" => Command::Post(rest.to_string()),
        "messages" => Command::Messages,
        "perform" => match rest.split_once(char::is_whitespace) {
            Some((link, title)) => Command::Perform {
                link: link.to_string(),
                title: title.trim().to_string(),
            },
            None => return Err("usage: perform <link> <title>".into()),
        },
        "performances" => Command::Performances,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();
    let mut watcher: Option<JoinHandle<()>> = None;

    match state.auth.current_user() {
        Some(user) => println!("Welcome back, {}.", user.email),
        None => println!("Welcome! Type 'signup' or 'login' to begin, 'help' for commands."),
    }

    loop {
        prompt("> ").await?;
        let Some(line) = input.next_line().await? else {
            break;
        };

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&state, command, &mut input, &mut watcher).await {
            println!("{e}");
        }
    }

    if let Some(w) = watcher.take() {
        w.abort();
    }
    Ok(())
}

async fn execute(
    state: &AppState,
    command: Command,
    input: &mut Input,
    watcher: &mut Option<JoinHandle<()>>,
) -> Result<(), String> {
    match command {
        Command::SignUp { email, password } => {
            let user = auth::sign_up(state, &email, &password).await?;
            println!("Account created for {}.", user.email);
        }
        Command::Login { email, password } => {
            let user = auth::sign_in(state, &email, &password).await?;
            println!("Signed in as {}.", user.email);
        }
        Command::Logout => {
            auth::sign_out(state).await?;
            println!("Signed out.");
        }
        Command::WhoAmI => match auth::who_am_i(state) {
            Some(user) => println!("{} ({})", user.email, user.uid.short()),
            None => println!("Not signed in."),
        },
        Command::Profile => match profile::get_profile(state).await? {
            Some(p) => println!(
                "{}\n  phone: {}\n  instrument: {}\n  age: {}\n  address: {}",
                p.full_name, p.phone_number, p.instrument, p.age, p.address
            ),
            None => println!("No profile yet, use 'profile-set'."),
        },
        Command::ProfileSet => {
            let current = profile::get_profile(state).await?;
            let mut form = current.as_ref().map(ProfileForm::from).unwrap_or_default();
            form.full_name = ask(input, "Full name", &form.full_name).await?;
            form.phone_number = ask(input, "Phone number", &form.phone_number).await?;
            form.instrument = ask(input, "Instrument", &form.instrument).await?;
            form.age = ask(input, "Age", &form.age).await?;
            form.address = ask(input, "Address", &form.address).await?;
            profile::save_profile(state, &form).await?;
            println!("Profile saved.");
        }
        Command::Start => {
            study::start_session(state)?;
            println!("Session started. Use 'stop' when you are done.");
        }
        Command::Stop => {
            let total = study::stop_session(state).await?;
            println!("Session saved. Today: {}", format_time(total));
        }
        Command::Status { watch } => {
            println!("{}", study::session_status(state).display());
            if watch {
                if let Some(w) = watcher.take() {
                    w.abort();
                }
                *watcher = Some(spawn_watcher(state));
            }
        }
        Command::Today => {
            let summary = study::today(state).await?;
            println!("Hello, {}!", summary.full_name);
            println!("Today: {}", format_time(summary.today_total));
            println!("{}", summary.achievement.message(summary.today_total));
            if let Some(badge) = summary.achievement.badge() {
                println!("Badge: {badge} (+{} points)", summary.achievement.points());
            }
        }
        Command::History { days } => {
            let logs = study::history(state, days).await?;
            if logs.is_empty() {
                println!("No study logs in this period.");
            }
            for log in logs {
                println!("{}  {}", format_date(log.date), format_time(log.total_time_millis));
            }
        }
        Command::Groups => {
            for view in groups::list_groups(state) {
                let marker = match (view.selected, view.is_member) {
                    (true, _) => "*",
                    (false, true) => "+",
                    (false, false) => " ",
                };
                println!(
                    "{marker} {:<8} {} - {}",
                    view.group.id, view.group.name, view.group.description
                );
            }
        }
        Command::Join(group) => {
            let messages = groups::join_group(state, &group).await?;
            println!("Joined {group}.");
            print_messages(&messages);
        }
        Command::Open(group) => {
            let messages = groups::open_group(state, &group).await?;
            print_messages(&messages);
        }
        Command::Post(text) => {
            groups::post_message(state, &text).await?;
        }
        Command::Messages => {
            let messages = groups::get_messages(state).await?;
            print_messages(&messages);
        }
        Command::Perform { link, title } => {
            let p = performances::publish_performance(state, &title, &link).await?;
            println!("Published '{}'.", p.title);
        }
        Command::Performances => {
            let list = performances::list_performances(state).await;
            if list.is_empty() {
                println!("No performances yet.");
            }
            for p in list {
                println!("{}  {} by {}\n    {}", p.published_at.format("%Y-%m-%d"), p.title, p.username, p.video_link);
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

/// Print the running session on every tick until it stops.
fn spawn_watcher(state: &AppState) -> JoinHandle<()> {
    let mut ticks = state.dashboard.timer().subscribe();
    tokio::spawn(async move {
        while let Some(elapsed) = ticks.changed().await {
            if elapsed == 0 {
                break;
            }
            println!("  studying {}", format_time(elapsed));
        }
    })
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages yet.");
    }
    for m in messages {
        let at = m
            .timestamp
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();
        let name = m.sender_name.as_deref().unwrap_or("?");
        println!("[{at}] {name}: {}", m.content);
    }
}

async fn prompt(text: &str) -> std::io::Result<()> {
    let mut out = tokio::io::stdout();
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

/// Ask for one field; an empty answer keeps `current`.
async fn ask(input: &mut Input, label: &str, current: &str) -> Result<String, String> {
    let text = if current.is_empty() {
        format!("{label}: ")
    } else {
        format!("{label} [{current}]: ")
    };
    prompt(&text).await.map_err(|e| e.to_string())?;
    match input.next_line().await.map_err(|e| e.to_string())? {
        Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        Some(_) => Ok(current.to_string()),
        None => Err("input closed".into()),
    }
}
