//! Built-in sample board

use once_cell_serde::sync::OnceCell;

use super::{Board, Category, Clue};

static SAMPLE_BOARD: OnceCell<Board> = OnceCell::new();

/// Returns the shared sample board, building it on first use
pub(super) fn board() -> &'static Board {
    SAMPLE_BOARD.get_or_init(|| Board {
        categories: vec![
            Category {
                name: "Science".to_owned(),
                clues: vec![
                    Clue::new(
                        100,
                        "Which planet is closest to the Sun?",
                        &["Venus", "Mercury", "Mars", "Earth"],
                        1,
                    ),
                    Clue::new(
                        200,
                        "Which molecule carries oxygen in the blood?",
                        &["Insulin", "Hemoglobin", "Glucose", "Collagen"],
                        1,
                    ),
                    Clue::new(
                        300,
                        "Which particle has a negative charge?",
                        &["Proton", "Neutron", "Electron", "Positron"],
                        2,
                    ),
                    Clue::new(
                        400,
                        "Which gas is essential for human respiration?",
                        &["Oxygen", "Carbon dioxide", "Nitrogen", "Hydrogen"],
                        0,
                    ),
                ],
            },
            Category {
                name: "History".to_owned(),
                clues: vec![
                    Clue::new(
                        100,
                        "In which year did Columbus reach the Americas?",
                        &["1492", "1519", "1776", "1453"],
                        0,
                    ),
                    Clue::new(
                        200,
                        "Which civilization built Machu Picchu?",
                        &["Aztec", "Maya", "Inca", "Olmec"],
                        2,
                    ),
                    Clue::new(
                        300,
                        "Who was known as the Liberator of the Americas?",
                        &[
                            "Simón Bolívar",
                            "José de San Martín",
                            "Miguel Hidalgo",
                            "Bernardo O'Higgins",
                        ],
                        0,
                    ),
                    Clue::new(
                        400,
                        "In which year did the Second World War begin?",
                        &["1935", "1939", "1941", "1945"],
                        1,
                    ),
                ],
            },
            Category {
                name: "Technology".to_owned(),
                clues: vec![
                    Clue::new(
                        100,
                        "What does 'CPU' stand for?",
                        &[
                            "Central Processing Unit",
                            "Computer Personal Unit",
                            "Core Processing Utility",
                            "Central Peripheral Unit",
                        ],
                        0,
                    ),
                    Clue::new(
                        200,
                        "Which protocol is typically used for the web?",
                        &["FTP", "SMTP", "HTTP", "SSH"],
                        2,
                    ),
                    Clue::new(
                        300,
                        "Which of these is a programming language?",
                        &["HTML", "CSS", "Python", "JSON"],
                        2,
                    ),
                    Clue::new(
                        400,
                        "Which protocol lets us browse the web securely?",
                        &["HTTP", "HTTPS", "FTP", "TELNET"],
                        1,
                    ),
                ],
            },
            Category {
                name: "Geography".to_owned(),
                clues: vec![
                    Clue::new(
                        100,
                        "Which is the longest river in the world?",
                        &["Amazon", "Nile", "Yangtze", "Mississippi"],
                        0,
                    ),
                    Clue::new(
                        200,
                        "On which continent is Egypt?",
                        &["Asia", "Africa", "Europe", "Oceania"],
                        1,
                    ),
                    Clue::new(
                        300,
                        "What is the capital of Japan?",
                        &["Beijing", "Seoul", "Tokyo", "Osaka"],
                        2,
                    ),
                    Clue::new(
                        400,
                        "Which country is shaped like a boot?",
                        &["Greece", "Italy", "Spain", "Portugal"],
                        1,
                    ),
                ],
            },
        ],
        image_folder: None,
    })
}
