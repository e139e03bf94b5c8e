use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::io::{stdin, stdout, Stdin, Write};

use connect4_engine::{board::*, difficulty::*};

/// Who controls each side of the game
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Opponent {
    Human,
    Engine(Difficulty),
    // the engine's pieces stay hidden until the game ends
    FogOfWar(Difficulty),
    EngineVsEngine,
}

fn prompt(stdin: &Stdin, question: &str) -> Result<String> {
    print!("{}", question);
    stdout().flush()?;
    let mut buffer = String::new();
    stdin.read_line(&mut buffer)?;
    Ok(buffer.trim().to_lowercase())
}

fn choose_opponent(stdin: &Stdin) -> Result<Opponent> {
    let fog = loop {
        let answer = prompt(
            stdin,
            "Play against (1) another player, (2) the engine, (3) the engine in fog of war, \
             or (4) watch engine vs engine? ",
        )?;
        match answer.chars().next() {
            Some('1') => return Ok(Opponent::Human),
            Some('2') => break false,
            Some('3') => break true,
            Some('4') => return Ok(Opponent::EngineVsEngine),
            _ => println!("Unknown answer given"),
        }
    };

    let tiers: Vec<String> = Difficulty::ALL
        .iter()
        .enumerate()
        .map(|(i, d)| format!("({}) {}", i + 1, d))
        .collect();
    loop {
        let answer = prompt(stdin, &format!("Choose a difficulty {}: ", tiers.join(" ")))?;
        match answer.parse::<Difficulty>() {
            Ok(difficulty) if fog => return Ok(Opponent::FogOfWar(difficulty)),
            Ok(difficulty) => return Ok(Opponent::Engine(difficulty)),
            Err(err) => println!("{}", err),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let stdin = stdin();
    let mut rng = rand::thread_rng();
    let mut board = Board::new();

    println!("Welcome to Connect 4\n");
    let opponent = choose_opponent(&stdin)?;

    // the engine opens when it plays itself
    let mut piece = match opponent {
        Opponent::EngineVsEngine => Piece::Ai,
        _ => Piece::Player,
    };

    // game loop
    loop {
        let state = board.state();
        match opponent {
            Opponent::FogOfWar(_) if state == GameState::Playing => {
                board.fogged(Piece::Player).display()?
            }
            _ => board.display()?,
        }

        match state {
            GameState::Playing => {
                let engine_turn = match opponent {
                    Opponent::Human => None,
                    Opponent::Engine(difficulty) | Opponent::FogOfWar(difficulty)
                        if piece == Piece::Ai =>
                    {
                        Some(difficulty)
                    }
                    Opponent::Engine(_) | Opponent::FogOfWar(_) => None,
                    Opponent::EngineVsEngine => Some(Difficulty::Hard),
                };

                let next_move = if let Some(difficulty) = engine_turn {
                    println!("Engine ({}) is thinking...", difficulty);
                    stdout().flush()?;

                    let column = choose_move(&board, difficulty, piece, &mut rng)?;
                    println!("Engine plays: {}", column + 1);
                    column + 1

                // human player
                } else {
                    let player = if piece == Piece::Player { 1 } else { 2 };
                    let input_str = prompt(&stdin, &format!("Player {} move input > ", player))?;
                    match input_str.parse::<usize>() {
                        Err(_) => {
                            println!("Invalid number: {}", input_str);
                            continue;
                        }
                        Ok(column) => column,
                    }
                };

                if let Err(err) = board.play_checked(next_move, piece) {
                    println!("{}", err);
                    // try the move again
                    continue;
                }
                piece = piece.opponent();
            }

            // end states
            GameState::Won(Piece::Player) => {
                println!("Player 1 wins!");
                break;
            }
            GameState::Won(_) => {
                match opponent {
                    Opponent::Human => println!("Player 2 wins!"),
                    _ => println!("The engine wins!"),
                }
                break;
            }
            GameState::Draw => {
                println!("Draw!");
                break;
            }
        }
    }
    Ok(())
}
