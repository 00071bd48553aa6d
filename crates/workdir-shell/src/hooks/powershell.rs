use workdir_backend::{ShellDialect, Verb, VersionManager};

use super::Dialect;

/// Windows PowerShell and PowerShell 7.
///
/// The real command runs inside `try`/`finally`, which also covers Ctrl+C
/// stopping the pipeline. PowerShell functions do not pass on a native exit
/// code, so it is written back to `$global:LASTEXITCODE`.
pub(super) struct PowerShell;

const TEMPLATE: &str = r##"{{HEADER}}
$global:NodeWorkdirEntries = {{ENTRIES}}
$global:NodeWorkdirManager = {{MANAGER}}

function global:Get-NodeWorkdirCurrentVersion {
    $node = Get-Command -Name node -CommandType Application -ErrorAction SilentlyContinue | Select-Object -First 1
    if (-not $node) { return '' }
    try {
        $raw = & $node.Source --version 2>$null | Select-Object -First 1
    } catch {
        return ''
    }
    if (-not $raw) { return '' }
    return ([string]$raw).Trim().TrimStart('v')
}

function global:Get-NodeWorkdirTarget([string]$Directory) {
    $comparison = [StringComparison]::Ordinal
    if ([Environment]::OSVersion.Platform -eq [PlatformID]::Win32NT) {
        $comparison = [StringComparison]::OrdinalIgnoreCase
    }
    $dir = $Directory.Replace('\', '/').TrimEnd('/') + '/'
    $best = ''
    $bestLength = -1
    foreach ($line in ($global:NodeWorkdirEntries -split "`n")) {
        $fields = $line -split "`t", 2
        if ($fields.Count -ne 2) { continue }
        $base = $fields[1].Replace('\', '/').TrimEnd('/')
        if ($dir.StartsWith($base + '/', $comparison) -and $base.Length -gt $bestLength) {
            $bestLength = $base.Length
            $best = $fields[0]
        }
    }
    return $best
}

{{LOADER}}

function global:Switch-NodeWorkdirVersion([string]$Version) {
    if (-not (Test-NodeWorkdirManager)) {
        Write-Host "node-workdir: $global:NodeWorkdirManager is not available, keeping the current Node version" -ForegroundColor Yellow
        return $false
    }
    try {
        {{USE_TARGET}} *> $null
        if ($LASTEXITCODE -eq 0) { return $true }
        Write-Host "node-workdir: installing Node $Version with $global:NodeWorkdirManager" -ForegroundColor Yellow
        {{INSTALL_TARGET}} | Out-Host
        if ($LASTEXITCODE -eq 0) {
            {{USE_TARGET}} *> $null
            if ($LASTEXITCODE -eq 0) { return $true }
        }
    } catch {
        Write-Host "node-workdir: $($_.Exception.Message)" -ForegroundColor Yellow
    }
    Write-Host "node-workdir: warning: could not switch to Node $Version, keeping the current version" -ForegroundColor Yellow
    return $false
}

function global:Invoke-NodeWorkdirCommand([string]$Name, [object[]]$Arguments) {
    $executable = Get-Command -Name $Name -CommandType Application -ErrorAction SilentlyContinue | Select-Object -First 1
    if (-not $executable) {
        Write-Error "node-workdir: $Name was not found on PATH"
        $global:LASTEXITCODE = 127
        return
    }
    $previous = Get-NodeWorkdirCurrentVersion
    $target = Get-NodeWorkdirTarget -Directory ((Get-Location).ProviderPath)
    $restore = $false
    if ($target -and $target -ne $previous) {
        if (Switch-NodeWorkdirVersion $target) {
            Write-Host "node-workdir: using Node $target for $Name" -ForegroundColor Cyan
            $restore = [bool]$previous
        }
    }
    $exitCode = 0
    try {
        & $executable.Source @Arguments
        $exitCode = $LASTEXITCODE
    } finally {
        if ($restore) {
            $restore = $false
            $restored = $false
            try {
                {{USE_PREVIOUS}} *> $null
                $restored = $LASTEXITCODE -eq 0
            } catch {
                $restored = $false
            }
            if ($restored) {
                Write-Host "node-workdir: restored Node $previous" -ForegroundColor Cyan
            } else {
                Write-Host "node-workdir: warning: could not restore Node $previous" -ForegroundColor Yellow
            }
        }
    }
    $global:LASTEXITCODE = $exitCode
}

{{WRAPPERS}}"##;

impl Dialect for PowerShell {
    fn kind(&self) -> ShellDialect {
        ShellDialect::PowerShell
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }

    fn target_version(&self) -> &'static str {
        "$Version"
    }

    fn previous_version(&self) -> &'static str {
        "$previous"
    }

    fn invoke_manager(&self, manager: VersionManager, verb: Verb, version: &str) -> String {
        format!("& {} {version}", manager.verbs().command_prefix(verb))
    }

    fn loader(&self, manager: VersionManager) -> String {
        format!(
            "function global:Test-NodeWorkdirManager {{\n    return [bool](Get-Command -Name {} -ErrorAction SilentlyContinue)\n}}",
            manager.verbs().program
        )
    }

    fn wrapper(&self, command: &str) -> String {
        format!(
            "function global:{command} {{\n    Invoke-NodeWorkdirCommand -Name '{command}' -Arguments $args\n}}"
        )
    }
}
