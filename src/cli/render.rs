// Text rendering of view displays for the terminal
use crate::models::{Analytics, User};
use crate::views::{DashboardDisplay, DetailDisplay, Tone, UploadsListDisplay, UsersDisplay};

pub fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "+",
        Tone::Warning => "~",
        Tone::Danger => "!",
        Tone::Muted => " ",
    }
}

pub fn print_uploads(display: &UploadsListDisplay) {
    match display {
        UploadsListDisplay::Skeleton { rows } => {
            for _ in 0..*rows {
                println!("  ░░░░░░░░░░░░░░░░░░░░  ░░░░░░░");
            }
            println!("Loading uploads...");
        }
        UploadsListDisplay::Empty { message } => println!("{}", message),
        UploadsListDisplay::Error { message } => eprintln!("Error: {}", message),
        UploadsListDisplay::Rows { rows, refreshing } => {
            println!("Upload History");
            for row in rows {
                println!(
                    "{} {:>6}  {:<40} {:<11} {}",
                    tone_label(row.tone),
                    row.id,
                    row.filename,
                    row.status,
                    row.uploaded_on
                );
            }
            if *refreshing {
                println!("(refreshing)");
            }
        }
    }
}

pub fn print_detail(display: &DetailDisplay) {
    match display {
        DetailDisplay::Loading => println!("Loading upload..."),
        DetailDisplay::Error { message } => eprintln!("Error: {}", message),
        DetailDisplay::Processing { filename, status, message }
        | DetailDisplay::NoResults { filename, status, message } => {
            print_detail_header(filename, &status.to_string());
            println!("{}", message);
        }
        DetailDisplay::Results { filename, status, cards } => {
            print_detail_header(filename, &status.to_string());
            for card in cards {
                println!();
                println!("{}", card.topic);
                println!(
                    "  {} · Avg. Sentiment: {} {}",
                    card.review_count,
                    tone_label(card.tone),
                    card.score
                );
                if !card.summary.is_empty() {
                    println!("  {}", card.summary);
                }
            }
        }
    }
}

fn print_detail_header(filename: &str, status: &str) {
    println!("{}", filename);
    println!("Status: {}", status);
    println!("Analysis Results by Topic");
}

pub fn print_users(display: &UsersDisplay) {
    match display {
        UsersDisplay::Skeleton { .. } => println!("Loading users..."),
        UsersDisplay::Error { message } => eprintln!("Error: {}", message),
        UsersDisplay::Users(users) if users.is_empty() => println!("No users found."),
        UsersDisplay::Users(users) => {
            for user in users {
                print_user(user);
            }
        }
    }
}

pub fn print_user(user: &User) {
    println!(
        "{:>6}  {:<24} {:<32} {}",
        user.id,
        user.display_name(),
        user.email,
        if user.is_admin { "Admin" } else { "" }
    );
}

pub fn print_dashboard(display: &DashboardDisplay) {
    match display {
        DashboardDisplay::Loading => println!("Loading analytics..."),
        DashboardDisplay::Error { message } => eprintln!("Error: {}", message),
        DashboardDisplay::Stats(stats) => print_stats(stats),
    }
}

fn print_stats(stats: &Analytics) {
    println!("Total users:            {}", stats.total_users);
    println!("Total uploads:          {}", stats.total_uploads);
    println!("Total analysis results: {}", stats.total_analysis_results);
    if !stats.uploads_by_status.is_empty() {
        println!("Uploads by status:");
        for (status, count) in &stats.uploads_by_status {
            println!("  {:<12} {}", status, count);
        }
    }
}
