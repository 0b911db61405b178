//! Fixed instruction templates.
//!
//! The system instruction constrains the model to the retrieved candidate
//! set: classify directly when unambiguous, ask follow-up questions only
//! about retrieved codes, ask for more detail when nothing fits.

use ateco_core::types::{CandidateRow, ConversationTurn, Role};

pub const SYSTEM_PROMPT: &str = "\
Sei un assistente per la classificazione di imprese italiane in attività economiche (ATECO 2025) partendo da una breve descrizione della loro attività.

Ricevi alcuni codici candidati:
* Se puoi classificare l'impresa con un codice tra i candidati senza ambiguità, classificala direttamente.
* Se c'è ambiguità tra più codici, fai domande di follow-up per scegliere il codice più opportuno, ma SOLAMENTE relative ai codici estratti.
* Se ritieni che nessuno dei codici candidati sia adatto, chiedi ulteriori dettagli sull'attività.

Alcuni suggerimenti riguardanti le attività: per distinguere tra codici simili, è importante capire l'attività svolta. Ad esempio, si tratta di fabbricazione o commercio? Vendita al dettaglio o all'ingrosso? Se rilevi queste differenze nei candidati e la descrizione non specifica l'attività precisa (produzione, fabbricazione, vendita, ecc.), chiedi chiarimenti.

Rispondi in maniera concisa.";

pub const SYSTEM_PROMPT_PARSING: &str = "\
Sei un assistente per la generazione di una descrizione dell'attività economica di un'impresa.

Ricevi una conversazione tra un utente e un assistente, in cui l'utente, in più messaggi, descrive la propria attività economica. Il tuo compito è quello di generare una descrizione coerente dell'attività economica dell'utente, basandoti sui messaggi precedenti.

Alcune istruzioni importanti:
* NON devi includere nella descrizione dettagli che non sono stati menzionati dall'utente.
* Il tuo compito è SOLO quello di generare un'unica descrizione coerente a partire dai messaggi utente precedenti.
* NON devi generare testo aggiuntivo nell'output che non sia la descrizione dell'attività economica.";

/// Newline-joined "code: title" list shown to the model (and the operator).
pub fn candidate_block(rows: &[CandidateRow]) -> String {
    rows.iter()
        .map(|r| format!("{}: {}", r.code, r.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-turn augmentation: raw input plus the candidate list.
pub fn augment_user_input(description: &str, candidates: &str) -> String {
    format!("Descrizione: {description}\n\nCandidati: {candidates}")
}

/// Render the transcript as role-labelled lines for the description task.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        match turn.role {
            Role::User => out.push_str(&format!("[UTENTE]: {}\n", turn.content)),
            Role::Assistant => out.push_str(&format!("[ASSISTENTE]: {}\n", turn.content)),
        }
    }
    out
}

pub fn parsing_instruction(turns: &[ConversationTurn]) -> String {
    format!("Conversazione tra UTENTE e ASSISTENTE:\n\n{}", render_transcript(turns))
}
