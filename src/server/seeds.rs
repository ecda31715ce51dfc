//! Built-in content: the video catalogue and the adaptive question bank.
//! The server is useful out of the box without any external data.

use crate::domain::{Question, Video};

fn video(id: &str, subject: &str, title: &str, description: &str, duration: &str, url: &str) -> Video {
  Video {
    id: id.into(),
    subject: subject.into(),
    title: title.into(),
    description: description.into(),
    duration: duration.into(),
    url: url.into(),
  }
}

fn question(id: &str, level: u8, text: &str, options: [&str; 4], answer_index: usize) -> Question {
  Question {
    id: id.into(),
    level,
    text: text.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    answer_index,
  }
}

pub fn seed_videos() -> Vec<Video> {
  vec![
    video("mat_fracciones", "Matemáticas", "Fracciones básicas", "Qué es una fracción y cómo se representa.", "06:30", "https://www.youtube.com/embed/fracciones"),
    video("mat_ecuaciones", "Matemáticas", "Ecuaciones de primer grado", "Despejar la incógnita paso a paso.", "12:10", "https://www.youtube.com/embed/ecuaciones"),
    video("len_sustantivos", "Lengua", "Sustantivos y adjetivos", "Clases de palabras y concordancia.", "08:45", "https://www.youtube.com/embed/sustantivos"),
    video("len_acentos", "Lengua", "Reglas de acentuación", "Agudas, llanas y esdrújulas.", "10:00", "https://www.youtube.com/embed/acentos"),
    video("cie_celula", "Ciencias", "La célula", "Partes de la célula animal y vegetal.", "09:20", "https://www.youtube.com/embed/celula"),
    video("cie_agua", "Ciencias", "El ciclo del agua", "Evaporación, condensación y precipitación.", "05:15", "https://www.youtube.com/embed/ciclo-agua"),
  ]
}

pub fn seed_questions() -> Vec<Question> {
  vec![
    question("q1_suma", 1, "¿Cuánto es 7 + 5?", ["10", "12", "13", "11"], 1),
    question("q1_resta", 1, "¿Cuánto es 15 - 9?", ["6", "5", "7", "4"], 0),
    question("q1_sustantivo", 1, "¿Cuál de estas palabras es un sustantivo?", ["correr", "mesa", "azul", "rápido"], 1),
    question("q2_fraccion", 2, "¿Qué fracción es equivalente a 1/2?", ["2/3", "3/6", "1/3", "2/5"], 1),
    question("q2_multiplicacion", 2, "¿Cuánto es 8 × 7?", ["54", "58", "56", "64"], 2),
    question("q2_esdrujula", 2, "¿Cuál es una palabra esdrújula?", ["canción", "árbol", "música", "reloj"], 2),
    question("q3_ecuacion", 3, "Si 3x + 4 = 19, ¿cuánto vale x?", ["3", "4", "6", "5"], 3),
    question("q3_celula", 3, "¿Qué orgánulo realiza la fotosíntesis?", ["mitocondria", "cloroplasto", "ribosoma", "núcleo"], 1),
    question("q3_porcentaje", 3, "¿Cuánto es el 15% de 200?", ["30", "25", "35", "20"], 0),
  ]
}
