//! # Shell Completion Module
//!
//! This module provides shell completion functionality for Moodtune, including:
//! - Generation of completion scripts for various shells
//! - Mood name completion for commands taking a mood argument
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
//!
//! # Generate fish completions with mood names
//! moodtune completion-enhanced fish > ~/.config/fish/completions/moodtune.fish
//! ```

use crate::mood::Mood;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Mood names in settings order, as offered to completion scripts.
#[must_use]
pub fn mood_completions() -> Vec<&'static str> {
    Mood::ALL.iter().map(|m| m.as_str()).collect()
}

/// Print mood names one per line (used by the enhanced scripts)
pub fn print_mood_completions() {
    for mood in mood_completions() {
        println!("{mood}");
    }
}

/// Generate enhanced fish completion script with mood name completion
pub fn generate_enhanced_fish_completion() {
    println!(r#"# Enhanced Moodtune completion script for Fish shell with mood name completion
# Install with: moodtune completion-enhanced fish > ~/.config/fish/completions/moodtune.fish

function __moodtune_complete_moods
    if command -sq moodtune
        moodtune complete-moods 2>/dev/null
    end
end

complete -c moodtune -e

complete -c moodtune -s h -l help -d 'Print help information'
complete -c moodtune -s V -l version -d 'Print version information'
complete -c moodtune -l settings -r -d 'Settings file to use'

complete -c moodtune -f -n '__fish_is_first_token' -a 'classify' -d 'Classify text into a mood'
complete -c moodtune -f -n '__fish_is_first_token' -a 'moods' -d 'List moods with their configured playlists'
complete -c moodtune -f -n '__fish_is_first_token' -a 'settings' -d 'Inspect or edit persisted settings'
complete -c moodtune -f -n '__fish_is_first_token' -a 'simulate' -d 'Run a player session against a scripted widget'
complete -c moodtune -f -n '__fish_is_first_token' -a 'completion' -d 'Generate shell completions'
complete -c moodtune -f -n '__fish_is_first_token' -a 'completion-enhanced' -d 'Generate enhanced shell completions'

complete -c moodtune -f -n '__fish_seen_subcommand_from classify' -l scores -d 'Print the score of every mood'

complete -c moodtune -f -n '__fish_seen_subcommand_from settings; and not __fish_seen_subcommand_from show set-playlist clear-playlist enable disable auto volume' -a 'show set-playlist clear-playlist enable disable auto volume'
complete -c moodtune -f -n '__fish_seen_subcommand_from set-playlist clear-playlist' -a '(__moodtune_complete_moods)' -d 'Mood'
complete -c moodtune -f -n '__fish_seen_subcommand_from auto' -a 'on off'

complete -c moodtune -n '__fish_seen_subcommand_from simulate' -s m -l message -r -d 'Inbound chat message'
complete -c moodtune -f -n '__fish_seen_subcommand_from simulate' -l mood -a '(__moodtune_complete_moods)' -d 'Mood to request first'
complete -c moodtune -f -n '__fish_seen_subcommand_from simulate' -l skip -d 'Skip after each transition'
complete -c moodtune -f -n '__fish_seen_subcommand_from simulate' -l seed -r -d 'Seed for track selection'

complete -c moodtune -f -n '__fish_seen_subcommand_from completion completion-enhanced' -a 'bash zsh fish power-shell elvish'
"#);
}

/// Generate enhanced bash completion script with mood name completion
pub fn generate_enhanced_bash_completion() {
    println!(r#"#!/bin/bash
# Enhanced Moodtune completion script with mood name completion
# Install with: moodtune completion-enhanced bash > ~/.local/share/bash-completion/completions/moodtune

_moodtune() {{
    local cur prev words cword
    _init_completion || return

    local commands="classify moods settings simulate completion completion-enhanced"
    local settings_actions="show set-playlist clear-playlist enable disable auto volume"

    case "$prev" in
        set-playlist|clear-playlist|--mood)
            COMPREPLY=($(compgen -W "$(moodtune complete-moods 2>/dev/null)" -- "$cur"))
            return
            ;;
        auto)
            COMPREPLY=($(compgen -W "on off" -- "$cur"))
            return
            ;;
        settings)
            COMPREPLY=($(compgen -W "$settings_actions" -- "$cur"))
            return
            ;;
        completion|completion-enhanced)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "$cur"))
            return
            ;;
        --settings)
            _filedir
            return
            ;;
    esac

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=($(compgen -W "$commands" -- "$cur"))
    fi
}}

complete -F _moodtune moodtune
"#);
}

/// Convert CLI shell enum to clap_complete shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}
