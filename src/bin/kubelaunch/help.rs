pub const COMPLETIONS_HELP: &str = "\
Discussion:
    Enable tab completion for Bash, Fish, Zsh, Elvish or PowerShell.
    The script is written to stdout, so it can be redirected to any file.

    Bash:
        kubelaunch completions bash > ~/.local/share/bash-completion/completions/kubelaunch

    Zsh:
        kubelaunch completions zsh > ~/.zfunc/_kubelaunch
        # then add `fpath+=~/.zfunc` before `compinit` in ~/.zshrc

    Fish:
        kubelaunch completions fish > ~/.config/fish/completions/kubelaunch.fish

    PowerShell:
        kubelaunch completions powershell >> $PROFILE
";

pub const TRAIN_AFTER_HELP: &str = "\
Arguments after `--` are appended verbatim to the master's command line:

    kubelaunch train --model_def ./mnist --image_name reg/mnist:v1 \\
        --job_name mnist -- --minibatch_size 64 --num_epochs 2
";
